//! Reporting types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Booked time of a room relative to the business hours of a range
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomUtilization {
    pub room_id: i32,
    pub room_name: String,
    pub total_booking_hours: f64,
    /// Fraction of available business hours booked (0.25 means a quarter)
    pub utilization_percent: f64,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct UtilizationQuery {
    /// Range start (inclusive)
    pub from: Option<DateTime<Utc>>,
    /// Range end (exclusive)
    pub to: Option<DateTime<Utc>>,
}
