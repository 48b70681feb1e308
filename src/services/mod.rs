pub mod authorization;
pub mod bookings;
pub mod identity;
pub mod validation;
