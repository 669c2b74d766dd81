//! Booking model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Default page size for booking listings
pub const DEFAULT_PAGE_LIMIT: i64 = 20;
/// Largest page a client may request
pub const MAX_PAGE_LIMIT: i64 = 100;
/// Longest accepted `Idempotency-Key` value
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// Booking lifecycle status. Transitions only CONFIRMED -> CANCELLED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Stored as TEXT, constrained by a CHECK in the schema
impl sqlx::Type<Postgres> for BookingStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BookingStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookingStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Booking of a room over the half-open interval `[start_time, end_time)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i32,
    pub room_id: i32,
    pub title: String,
    pub organizer_email: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }
}

/// Create booking request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    pub room_id: i32,
    pub title: String,
    #[validate(email(message = "organizerEmail must be a valid email address"))]
    pub organizer_email: String,
    /// RFC 3339 timestamp, any offset
    pub start_time: DateTime<Utc>,
    /// RFC 3339 timestamp, any offset
    pub end_time: DateTime<Utc>,
}

/// Row about to be inserted by the booking workflow
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub room_id: i32,
    pub title: String,
    pub organizer_email: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub idempotency_key: Option<String>,
}

impl NewBooking {
    pub fn from_request(data: &CreateBooking, idempotency_key: Option<&str>) -> Self {
        Self {
            room_id: data.room_id,
            title: data.title.clone(),
            organizer_email: data.organizer_email.clone(),
            start_time: data.start_time,
            end_time: data.end_time,
            idempotency_key: idempotency_key.map(str::to_string),
        }
    }
}

/// Query parameters for listing bookings
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookingQuery {
    pub room_id: Option<i32>,
    /// Only bookings ending after this instant
    pub from: Option<DateTime<Utc>>,
    /// Only bookings starting before this instant
    pub to: Option<DateTime<Utc>>,
    /// Page size (default: 20, max: 100)
    pub limit: Option<i64>,
    /// Rows to skip (default: 0)
    pub offset: Option<i64>,
}

/// Normalized listing filter handed to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingFilter {
    pub room_id: Option<i32>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl BookingFilter {
    /// Whether a booking falls inside the filter, ignoring paging.
    /// With both bounds the booking must overlap `[from, to)`.
    pub fn matches(&self, booking: &Booking) -> bool {
        if let Some(room_id) = self.room_id {
            if booking.room_id != room_id {
                return false;
            }
        }
        if let Some(from) = self.from {
            if booking.end_time <= from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if booking.start_time >= to {
                return false;
            }
        }
        true
    }
}

/// One page of bookings ordered by start time
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingPage {
    pub items: Vec<Booking>,
    /// Number of bookings matching the filter across all pages
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
