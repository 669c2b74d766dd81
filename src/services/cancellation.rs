//! Cancellation cutoff policy

use chrono::{DateTime, Duration, Utc};

use super::time_rules::describe_minutes;
use crate::{
    error::{AppError, AppResult},
    models::booking::Booking,
};

#[derive(Debug, Clone, Copy)]
pub struct CancellationPolicy {
    cutoff_minutes: i64,
}

impl CancellationPolicy {
    pub fn new(cutoff_minutes: i64) -> Self {
        Self { cutoff_minutes }
    }

    /// A booking may be cancelled while at least the cutoff remains before it starts
    pub fn check(&self, booking: &Booking, now: DateTime<Utc>) -> AppResult<()> {
        if booking.start_time - now < Duration::minutes(self.cutoff_minutes) {
            return Err(AppError::Validation(format!(
                "Cancellation allowed up to {} before start",
                describe_minutes(self.cutoff_minutes)
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::BookingStatus;

    fn booking_starting_at(start: DateTime<Utc>) -> Booking {
        Booking {
            id: 7,
            room_id: 1,
            title: "Retro".into(),
            organizer_email: "pm@example.com".into(),
            start_time: start,
            end_time: start + Duration::hours(1),
            status: BookingStatus::Confirmed,
            idempotency_key: None,
            created_at: start - Duration::days(1),
        }
    }

    #[test]
    fn test_inside_cutoff_is_rejected() {
        let now = Utc::now();
        let booking = booking_starting_at(now + Duration::minutes(30));
        match CancellationPolicy::new(60).check(&booking, now) {
            Err(AppError::Validation(msg)) => {
                assert_eq!(msg, "Cancellation allowed up to 1 hour before start")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_exact_cutoff_is_allowed() {
        let now = Utc::now();
        let booking = booking_starting_at(now + Duration::minutes(60));
        assert!(CancellationPolicy::new(60).check(&booking, now).is_ok());
    }

    #[test]
    fn test_started_booking_is_rejected() {
        let now = Utc::now();
        let booking = booking_starting_at(now - Duration::minutes(5));
        assert!(CancellationPolicy::new(60).check(&booking, now).is_err());
    }
}
