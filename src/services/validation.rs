use chrono::{DateTime, Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::{
    Address, AddressPayload, BookingPatch, BookingPayload, BookingStatus, NewBooking, ServiceType,
    NOTES_MAX_CHARS, TIME_SLOTS,
};

/// Dates are stored as `YYYY-MM-DD` text and listed by string order, which
/// only matches calendar order for four-digit years.
const MAX_YEAR: i32 = 9999;

static ZIP_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5}(-\d{4})?$").unwrap());

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validates a create request. Every field except `notes` is required.
pub fn validate_create(
    payload: &BookingPayload,
    today: NaiveDate,
) -> Result<NewBooking, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    let service = keep(
        &mut violations,
        required(&payload.service, "service").and_then(parse_service),
    );
    let date = keep(
        &mut violations,
        required(&payload.date, "date").and_then(|s| parse_date(s, today)),
    );
    let time_slot = keep(
        &mut violations,
        required(&payload.time_slot, "timeSlot").and_then(parse_time_slot),
    );
    let notes = keep(
        &mut violations,
        payload.notes.as_deref().map(parse_notes).transpose(),
    )
    .flatten()
    .flatten();
    let address = match &payload.address {
        Some(address) => keep_all(&mut violations, parse_address(address)),
        None => {
            violations.push(FieldViolation::new("address", "address is required"));
            None
        }
    };

    match (service, date, time_slot, address) {
        (Some(service), Some(date), Some(time_slot), Some(address)) if violations.is_empty() => {
            Ok(NewBooking {
                service,
                date,
                time_slot,
                notes,
                address,
            })
        }
        _ => Err(violations),
    }
}

/// Validates a partial update. Only supplied fields are checked; absent
/// fields stay `None` in the resulting patch.
pub fn validate_update(
    payload: &BookingPayload,
    today: NaiveDate,
) -> Result<BookingPatch, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    let service = keep(
        &mut violations,
        payload.service.as_deref().map(parse_service).transpose(),
    )
    .flatten();
    let date = keep(
        &mut violations,
        payload.date.as_deref().map(|s| parse_date(s, today)).transpose(),
    )
    .flatten();
    let time_slot = keep(
        &mut violations,
        payload.time_slot.as_deref().map(parse_time_slot).transpose(),
    )
    .flatten();
    let notes = keep(
        &mut violations,
        payload.notes.as_deref().map(parse_notes).transpose(),
    )
    .flatten();
    let address = payload
        .address
        .as_ref()
        .and_then(|a| keep_all(&mut violations, parse_address(a)));
    let status = keep(
        &mut violations,
        payload.status.as_deref().map(parse_status).transpose(),
    )
    .flatten();

    if !violations.is_empty() {
        return Err(violations);
    }

    Ok(BookingPatch {
        service,
        date,
        time_slot,
        notes,
        address,
        status,
    })
}

fn keep<T>(violations: &mut Vec<FieldViolation>, result: Result<T, FieldViolation>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(v) => {
            violations.push(v);
            None
        }
    }
}

fn keep_all<T>(
    violations: &mut Vec<FieldViolation>,
    result: Result<T, Vec<FieldViolation>>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(mut v) => {
            violations.append(&mut v);
            None
        }
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, FieldViolation> {
    match value.as_deref() {
        Some(s) => Ok(s),
        None => Err(FieldViolation::new(field, format!("{field} is required"))),
    }
}

fn parse_service(s: &str) -> Result<ServiceType, FieldViolation> {
    ServiceType::parse(s).ok_or_else(|| {
        FieldViolation::new(
            "service",
            "service must be one of Cleaning, Laundry, Maintenance, Moving",
        )
    })
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (what browsers send for a
/// date picker value serialized with `toISOString`).
fn parse_date(s: &str, today: NaiveDate) -> Result<NaiveDate, FieldViolation> {
    let s = s.trim();
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .ok_or_else(|| FieldViolation::new("date", "date must be a valid calendar date"))?;

    if date < today {
        return Err(FieldViolation::new("date", "date cannot be in the past"));
    }
    if date.year() > MAX_YEAR {
        return Err(FieldViolation::new(
            "date",
            format!("date cannot be later than the year {MAX_YEAR}"),
        ));
    }
    Ok(date)
}

fn parse_time_slot(s: &str) -> Result<String, FieldViolation> {
    if s.trim().is_empty() {
        return Err(FieldViolation::new("timeSlot", "timeSlot is required"));
    }
    if !TIME_SLOTS.contains(&s) {
        return Err(FieldViolation::new(
            "timeSlot",
            format!("timeSlot must be one of: {}", TIME_SLOTS.join(", ")),
        ));
    }
    Ok(s.to_string())
}

/// An empty string means "no notes".
fn parse_notes(s: &str) -> Result<Option<String>, FieldViolation> {
    if s.chars().count() > NOTES_MAX_CHARS {
        return Err(FieldViolation::new(
            "notes",
            format!("notes cannot exceed {NOTES_MAX_CHARS} characters"),
        ));
    }
    if s.is_empty() {
        Ok(None)
    } else {
        Ok(Some(s.to_string()))
    }
}

fn parse_status(s: &str) -> Result<BookingStatus, FieldViolation> {
    BookingStatus::parse(s).ok_or_else(|| {
        FieldViolation::new(
            "status",
            "status must be one of pending, confirmed, completed, cancelled",
        )
    })
}

fn parse_address(address: &AddressPayload) -> Result<Address, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    let mut non_empty = |value: &Option<String>, field: &str| match value.as_deref() {
        Some(s) if !s.trim().is_empty() => Some(s.to_string()),
        _ => {
            violations.push(FieldViolation::new(field, format!("{field} is required")));
            None
        }
    };

    let street = non_empty(&address.street, "address.street");
    let city = non_empty(&address.city, "address.city");
    let state = non_empty(&address.state, "address.state");
    let zip_code = non_empty(&address.zip_code, "address.zipCode");

    let zip_code = zip_code.and_then(|zip| {
        if ZIP_CODE.is_match(&zip) {
            Some(zip)
        } else {
            violations.push(FieldViolation::new(
                "address.zipCode",
                "zipCode must be 5 digits or ZIP+4 (12345-6789)",
            ));
            None
        }
    });

    match (street, city, state, zip_code) {
        (Some(street), Some(city), Some(state), Some(zip_code)) => Ok(Address {
            street,
            city,
            state,
            zip_code,
        }),
        _ => Err(violations),
    }
}
