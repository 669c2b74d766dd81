//! Replay handling for booking creations carrying an `Idempotency-Key`

use crate::{
    error::{AppError, AppResult},
    models::booking::{Booking, MAX_IDEMPOTENCY_KEY_LEN},
    repository::{BookingStore, BookingUnitOfWork},
};

/// Normalize a raw header value. Empty keys count as absent.
pub fn normalize_key(raw: Option<&str>) -> AppResult<Option<&str>> {
    match raw {
        None | Some("") => Ok(None),
        Some(key) if key.len() > MAX_IDEMPOTENCY_KEY_LEN => Err(AppError::Validation(format!(
            "Idempotency-Key must be at most {} characters",
            MAX_IDEMPOTENCY_KEY_LEN
        ))),
        Some(key) => Ok(Some(key)),
    }
}

/// Booking previously created in this room under the same key, if any.
/// Looked up inside the unit of work so the answer holds until commit.
pub async fn find_previous(
    uow: &mut dyn BookingUnitOfWork,
    room_id: i32,
    key: &str,
) -> AppResult<Option<Booking>> {
    let existing = uow.find_by_idempotency_key(room_id, key).await?;
    if let Some(ref booking) = existing {
        tracing::info!(room_id, booking_id = booking.id, "Replaying idempotent booking creation");
    }
    Ok(existing)
}

/// Resolve a unique violation on (room, key) raised by a concurrent
/// identical request: the winner's row is returned instead of the error.
/// Call only after the failed unit of work has been dropped.
pub async fn recover_from_race(
    store: &dyn BookingStore,
    room_id: i32,
    key: &str,
    violation: AppError,
) -> AppResult<Booking> {
    match store.find_by_idempotency_key(room_id, key).await? {
        Some(booking) => {
            tracing::info!(room_id, booking_id = booking.id, "Recovered idempotent booking after concurrent insert");
            Ok(booking)
        }
        None => Err(violation),
    }
}
