use crate::models::{Booking, BookingStatus, Identity};

/// Read access (`get`) is strictly owner-only, admins included.
pub fn can_view(identity: &Identity, booking: &Booking) -> bool {
    booking.owner == identity.user_id
}

/// Mutating access (update, cancel, delete): the owner, or any admin.
pub fn can_act_on(identity: &Identity, booking: &Booking) -> bool {
    identity.is_admin() || booking.owner == identity.user_id
}

/// Non-admins may only edit bookings that are still pending.
pub fn passes_pending_gate(identity: &Identity, booking: &Booking) -> bool {
    identity.is_admin() || booking.status == BookingStatus::Pending
}

pub fn may_set_status(identity: &Identity) -> bool {
    identity.is_admin()
}
