//! Booking intake and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use booking_store::{Booking, BookingStore};
use chrono::SecondsFormat;
use domain::{BookingService, CreateBooking};
use event_bus::EventBus;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S, B> {
    pub booking_service: BookingService<S, B>,
}

impl<S: BookingStore, B: EventBus> AppState<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self {
            booking_service: BookingService::new(store, bus),
        }
    }
}

// -- Request types --

/// Missing ids deserialize as empty and are rejected by intake validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub hotel_id: String,
    #[serde(default)]
    pub promo_code: Option<String>,
}

impl From<CreateBookingRequest> for CreateBooking {
    fn from(req: CreateBookingRequest) -> Self {
        let cmd = CreateBooking::new(req.user_id, req.hotel_id);
        match req.promo_code {
            Some(code) => cmd.with_promo_code(code),
            None => cmd,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsQuery {
    pub user_id: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub id: String,
    pub user_id: String,
    pub hotel_id: String,
    pub promo_code: String,
    pub discount_percent: f64,
    pub price: f64,
    pub status: String,
    pub created_at: String,
}

impl From<Booking> for BookingView {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id.as_str().to_string(),
            user_id: booking.user_id,
            hotel_id: booking.hotel_id,
            promo_code: booking.promo_code,
            discount_percent: booking.discount_percent,
            price: booking.price,
            status: booking.status.as_str().to_string(),
            created_at: booking.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListBookingsResponse {
    pub bookings: Vec<BookingView>,
}

// -- Handlers --

/// POST /bookings: create a provisional booking and request its validation.
#[tracing::instrument(skip(state, body))]
pub async fn create<S, B>(
    State(state): State<Arc<AppState<S, B>>>,
    body: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingView>), ApiError>
where
    S: BookingStore + 'static,
    B: EventBus + 'static,
{
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let booking = state.booking_service.create_booking(req.into()).await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// GET /bookings: list bookings, optionally filtered by `userId`.
#[tracing::instrument(skip(state))]
pub async fn list<S, B>(
    State(state): State<Arc<AppState<S, B>>>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<ListBookingsResponse>, ApiError>
where
    S: BookingStore + 'static,
    B: EventBus + 'static,
{
    let user_id = query.user_id.as_deref().filter(|u| !u.is_empty());
    let bookings = state.booking_service.list_bookings(user_id).await?;

    Ok(Json(ListBookingsResponse {
        bookings: bookings.into_iter().map(BookingView::from).collect(),
    }))
}
