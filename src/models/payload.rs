use chrono::NaiveDate;
use serde::Deserialize;

use super::{Address, Booking, BookingStatus, ServiceType};

/// Raw booking body as sent by clients. Every field is optional so that the
/// validation layer can report all problems at once instead of failing on the
/// first serde error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    pub service: Option<String>,
    pub date: Option<String>,
    pub time_slot: Option<String>,
    pub notes: Option<String>,
    pub address: Option<AddressPayload>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// A fully validated create request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub service: ServiceType,
    pub date: NaiveDate,
    pub time_slot: String,
    pub notes: Option<String>,
    pub address: Address,
}

/// A validated update. `None` means "not supplied, keep the current value".
/// For `notes`, `Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingPatch {
    pub service: Option<ServiceType>,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub notes: Option<Option<String>>,
    pub address: Option<Address>,
    pub status: Option<BookingStatus>,
}

impl BookingPatch {
    /// Overwrites only the supplied descriptive fields. `status` is left to the
    /// lifecycle engine, which authorizes it separately.
    pub fn merge_into(self, booking: &mut Booking) {
        if let Some(service) = self.service {
            booking.service = service;
        }
        if let Some(date) = self.date {
            booking.date = date;
        }
        if let Some(time_slot) = self.time_slot {
            booking.time_slot = time_slot;
        }
        if let Some(notes) = self.notes {
            booking.notes = notes;
        }
        if let Some(address) = self.address {
            booking.address = address;
        }
    }
}
