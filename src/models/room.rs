//! Room model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Meeting room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i32,
    pub name: String,
    /// Number of seats (at least 1)
    pub capacity: i32,
    pub floor: Option<i32>,
    /// Amenity tags, e.g. "tv" or "whiteboard"
    pub amenities: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Create room request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoom {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(range(min = 1, message = "capacity must be >= 1"))]
    pub capacity: i32,
    pub floor: Option<i32>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl CreateRoom {
    /// Order in which field errors are reported
    pub const FIELD_ORDER: &'static [&'static str] = &["name", "capacity"];

    /// Amenities with duplicates removed, first occurrence kept
    pub fn unique_amenities(&self) -> Vec<String> {
        let mut seen = Vec::with_capacity(self.amenities.len());
        for amenity in &self.amenities {
            if !seen.contains(amenity) {
                seen.push(amenity.clone());
            }
        }
        seen
    }
}

/// Query parameters for listing rooms
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RoomQuery {
    /// Only rooms with at least this many seats
    pub min_capacity: Option<i32>,
    /// Only rooms listing exactly this amenity
    pub amenity: Option<String>,
}

impl RoomQuery {
    /// Whether a room passes this filter
    pub fn matches(&self, room: &Room) -> bool {
        if let Some(min) = self.min_capacity {
            if room.capacity < min {
                return false;
            }
        }
        match &self.amenity {
            Some(amenity) => room.amenities.iter().any(|a| a == amenity),
            None => true,
        }
    }
}
