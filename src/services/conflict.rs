//! Overlap detection between bookings of the same room

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    repository::BookingUnitOfWork,
};

/// Half-open intervals `[s1, e1)` and `[s2, e2)` share an instant.
/// Touching endpoints do not overlap.
pub fn overlaps(s1: DateTime<Utc>, e1: DateTime<Utc>, s2: DateTime<Utc>, e2: DateTime<Utc>) -> bool {
    s1 < e2 && s2 < e1
}

/// Fail with a conflict when a confirmed booking of the room overlaps
/// `[start, end)`. Must run inside the unit of work that performs the insert.
pub async fn ensure_room_free(
    uow: &mut dyn BookingUnitOfWork,
    room_id: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<()> {
    if uow.has_overlap(room_id, start, end).await? {
        tracing::debug!(room_id, %start, %end, "Overlapping booking exists");
        return Err(AppError::Conflict("Overlapping booking exists".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 3, 4, h, 0, 0).unwrap()
    }

    #[test]
    fn test_overlap_cases() {
        // contained, partial on each side, identical, enclosing
        assert!(overlaps(t(9), t(12), t(10), t(11)));
        assert!(overlaps(t(9), t(11), t(10), t(12)));
        assert!(overlaps(t(10), t(12), t(9), t(11)));
        assert!(overlaps(t(9), t(10), t(9), t(10)));
        assert!(overlaps(t(10), t(11), t(9), t(12)));
    }

    #[test]
    fn test_touching_and_disjoint_do_not_overlap() {
        assert!(!overlaps(t(9), t(10), t(10), t(11)));
        assert!(!overlaps(t(10), t(11), t(9), t(10)));
        assert!(!overlaps(t(9), t(10), t(14), t(15)));
    }
}
