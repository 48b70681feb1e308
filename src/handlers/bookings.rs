use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{Booking, BookingPayload, Identity};
use crate::state::AppState;

#[derive(Serialize)]
pub struct BookingEnvelope {
    message: &'static str,
    booking: Booking,
}

#[derive(Serialize)]
pub struct MessageResponse {
    message: &'static str,
}

fn json_payload(
    body: Result<Json<BookingPayload>, JsonRejection>,
) -> Result<BookingPayload, AppError> {
    body.map(|Json(p)| p)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    body: Result<Json<BookingPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingEnvelope>), AppError> {
    let payload = json_payload(body)?;
    let booking = state.bookings.create(&identity, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingEnvelope {
            message: "Booking created successfully",
            booking,
        }),
    ))
}

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.bookings.list(&identity).await?))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.get(&identity, &id).await?))
}

// PUT /api/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
    body: Result<Json<BookingPayload>, JsonRejection>,
) -> Result<Json<BookingEnvelope>, AppError> {
    let payload = json_payload(body)?;
    let booking = state.bookings.update(&identity, &id, &payload).await?;

    Ok(Json(BookingEnvelope {
        message: "Booking updated successfully",
        booking,
    }))
}

// PATCH /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<BookingEnvelope>, AppError> {
    let booking = state.bookings.cancel(&identity, &id).await?;

    Ok(Json(BookingEnvelope {
        message: "Booking cancelled successfully",
        booking,
    }))
}

// DELETE /api/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.bookings.delete(&identity, &id).await?;

    Ok(Json(MessageResponse {
        message: "Booking deleted successfully",
    }))
}
