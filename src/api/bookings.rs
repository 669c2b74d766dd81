//! Booking endpoints

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::WithRejection;

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::booking::{Booking, BookingPage, BookingQuery, CreateBooking},
};

/// Header carrying the client's retry token
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Create a booking
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    request_body = CreateBooking,
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "Retry token; repeats return the original booking")
    ),
    responses(
        (status = 201, description = "Booking created (or replayed)", body = Booking),
        (status = 400, description = "Invalid interval, duration or hours", body = ErrorResponse),
        (status = 404, description = "Unknown room", body = ErrorResponse),
        (status = 409, description = "Overlapping booking exists", body = ErrorResponse)
    )
)]
pub async fn create_booking(
    State(state): State<crate::AppState>,
    headers: HeaderMap,
    WithRejection(Json(data), _): WithRejection<Json<CreateBooking>, AppError>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    let idempotency_key = match headers.get(IDEMPOTENCY_KEY_HEADER) {
        Some(value) => Some(value.to_str().map_err(|_| {
            AppError::Validation("Idempotency-Key must be visible ASCII".to_string())
        })?),
        None => None,
    };

    let booking = state
        .services
        .bookings
        .create_booking(data, idempotency_key)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// List bookings with filters and pagination
#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    params(BookingQuery),
    responses(
        (status = 200, description = "Bookings ordered by start time", body = BookingPage),
        (status = 400, description = "Invalid filter or paging", body = ErrorResponse)
    )
)]
pub async fn list_bookings(
    State(state): State<crate::AppState>,
    WithRejection(Query(query), _): WithRejection<Query<BookingQuery>, AppError>,
) -> AppResult<Json<BookingPage>> {
    let page = state.services.bookings.list_bookings(&query).await?;
    Ok(Json(page))
}

/// Cancel a booking
#[utoipa::path(
    post,
    path = "/bookings/{id}/cancel",
    tag = "bookings",
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking cancelled (or already cancelled)", body = Booking),
        (status = 400, description = "Inside the cancellation cutoff", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse)
    )
)]
pub async fn cancel_booking(
    State(state): State<crate::AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<Json<Booking>> {
    let booking = state.services.bookings.cancel_booking(id).await?;
    Ok(Json(booking))
}
