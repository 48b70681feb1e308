use std::sync::Arc;

use chrono::{Local, NaiveDate, Timelike, Utc};

use crate::db::BookingStore;
use crate::models::{Booking, BookingPayload, BookingStatus, Identity};
use crate::services::authorization;
use crate::services::validation::{self, FieldViolation};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("validation failed")]
    Validation(Vec<FieldViolation>),

    #[error("Booking not found")]
    NotFound,

    #[error("{0}")]
    InvalidState(String),

    #[error("unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

/// Owns the booking status machine and the rules deciding who may touch which
/// booking. Storage is delegated to the injected [`BookingStore`].
#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        identity: &Identity,
        payload: &BookingPayload,
    ) -> Result<Booking, BookingError> {
        let new = validation::validate_create(payload, today()).map_err(BookingError::Validation)?;

        let created_at = Utc::now();
        let booking = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            owner: identity.user_id.clone(),
            service: new.service,
            date: new.date,
            time_slot: new.time_slot,
            notes: new.notes,
            address: new.address,
            status: BookingStatus::Pending,
            created_at: created_at.with_nanosecond(0).unwrap_or(created_at),
        };

        self.store.insert(&booking).await?;

        tracing::info!(
            booking_id = %booking.id,
            user_id = %identity.user_id,
            service = booking.service.as_str(),
            date = %booking.date,
            "booking created"
        );

        Ok(booking)
    }

    /// The caller's own bookings, newest date first. Never includes other users'
    /// bookings, whatever the caller's role.
    pub async fn list(&self, identity: &Identity) -> Result<Vec<Booking>, BookingError> {
        Ok(self.store.find_by_owner(&identity.user_id).await?)
    }

    pub async fn get(&self, identity: &Identity, id: &str) -> Result<Booking, BookingError> {
        match self.store.find_by_id(id).await? {
            Some(booking) if authorization::can_view(identity, &booking) => Ok(booking),
            _ => Err(BookingError::NotFound),
        }
    }

    pub async fn update(
        &self,
        identity: &Identity,
        id: &str,
        payload: &BookingPayload,
    ) -> Result<Booking, BookingError> {
        let mut booking = self.load_for_write(identity, id).await?;

        if !authorization::passes_pending_gate(identity, &booking) {
            return Err(BookingError::InvalidState(
                "Cannot modify booking that is not in pending status".to_string(),
            ));
        }

        let mut patch =
            validation::validate_update(payload, today()).map_err(BookingError::Validation)?;

        let next_status = match patch.status.take() {
            Some(next) if next != booking.status => {
                check_status_change(identity, booking.status, next)?;
                Some(next)
            }
            _ => None,
        };

        patch.merge_into(&mut booking);
        if let Some(next) = next_status {
            tracing::info!(
                booking_id = %booking.id,
                user_id = %identity.user_id,
                from = booking.status.as_str(),
                to = next.as_str(),
                "booking status changed"
            );
            booking.status = next;
        }

        self.store.save(&booking).await?;

        tracing::info!(booking_id = %booking.id, user_id = %identity.user_id, "booking updated");

        Ok(booking)
    }

    /// One-shot: cancelling an already cancelled booking is an error.
    pub async fn cancel(&self, identity: &Identity, id: &str) -> Result<Booking, BookingError> {
        let mut booking = self.load_for_write(identity, id).await?;

        if !booking.status.is_cancellable() {
            return Err(BookingError::InvalidState(
                "Cannot cancel booking that is completed or already cancelled".to_string(),
            ));
        }

        booking.status = BookingStatus::Cancelled;
        self.store.save(&booking).await?;

        tracing::info!(booking_id = %booking.id, user_id = %identity.user_id, "booking cancelled");

        Ok(booking)
    }

    /// Permanent removal, allowed from any status.
    pub async fn delete(&self, identity: &Identity, id: &str) -> Result<(), BookingError> {
        let booking = self.load_for_write(identity, id).await?;

        if !self.store.delete_by_id(&booking.id).await? {
            // Removed by a concurrent request between load and delete.
            return Err(BookingError::NotFound);
        }

        tracing::info!(
            booking_id = %booking.id,
            user_id = %identity.user_id,
            status = booking.status.as_str(),
            "booking deleted"
        );

        Ok(())
    }

    /// Missing and not-yours are both reported as `NotFound`.
    async fn load_for_write(&self, identity: &Identity, id: &str) -> Result<Booking, BookingError> {
        match self.store.find_by_id(id).await? {
            Some(booking) if authorization::can_act_on(identity, &booking) => Ok(booking),
            _ => Err(BookingError::NotFound),
        }
    }
}

fn check_status_change(
    identity: &Identity,
    current: BookingStatus,
    next: BookingStatus,
) -> Result<(), BookingError> {
    if !authorization::may_set_status(identity) {
        return Err(BookingError::InvalidState(
            "Only an admin can change booking status".to_string(),
        ));
    }
    if !current.can_transition_to(next) {
        return Err(BookingError::InvalidState(format!(
            "Cannot change booking status from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
