pub mod booking;
pub mod payload;
pub mod user;

pub use booking::{Address, Booking, BookingStatus, ServiceType, NOTES_MAX_CHARS, TIME_SLOTS};
pub use payload::{AddressPayload, BookingPatch, BookingPayload, NewBooking};
pub use user::{Identity, Role};
