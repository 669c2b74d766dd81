//! Calendar and duration rules for bookings.
//!
//! All calendar arithmetic happens in UTC: weekday, time of day and the
//! business window of a date are taken from the UTC representation of a
//! timestamp, whatever offset the client sent.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc, Weekday};

use crate::{
    config::BookingRules,
    error::{AppError, AppResult},
};

/// Render a minute count the way rule messages phrase it ("15 minutes", "4 hours")
pub fn describe_minutes(minutes: i64) -> String {
    match minutes {
        60 => "1 hour".to_string(),
        m if m > 0 && m % 60 == 0 => format!("{} hours", m / 60),
        1 => "1 minute".to_string(),
        m => format!("{} minutes", m),
    }
}

/// Monday to Friday
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Time of day in fractional hours, seconds ignored (08:30:45 -> 8.5)
pub fn hour_of_day(ts: DateTime<Utc>) -> f64 {
    ts.hour() as f64 + ts.minute() as f64 / 60.0
}

#[derive(Debug, Clone)]
pub struct TimeRules {
    rules: BookingRules,
}

impl TimeRules {
    pub fn new(rules: BookingRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &BookingRules {
        &self.rules
    }

    /// Business window `[open, close)` of a calendar day
    pub fn business_window(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let day_start = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));
        (
            day_start + chrono::Duration::hours(self.rules.business_start_hour as i64),
            day_start + chrono::Duration::hours(self.rules.business_end_hour as i64),
        )
    }

    /// Check a requested booking interval.
    ///
    /// Checks run in order: interval ordering, duration bounds, business
    /// days and hours. The first failure is reported.
    pub fn validate_interval(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
        if start >= end {
            return Err(AppError::Validation(
                "startTime must be before endTime".to_string(),
            ));
        }

        let minutes = (end - start).num_milliseconds() as f64 / 60_000.0;
        if minutes < self.rules.min_duration_minutes as f64
            || minutes > self.rules.max_duration_minutes as f64
        {
            return Err(AppError::Validation(format!(
                "Booking duration must be between {} and {}",
                describe_minutes(self.rules.min_duration_minutes),
                describe_minutes(self.rules.max_duration_minutes)
            )));
        }

        if !self.within_business_hours(start, end) {
            return Err(AppError::Validation(format!(
                "Bookings allowed Mon-Fri {:02}:00-{:02}:00",
                self.rules.business_start_hour, self.rules.business_end_hour
            )));
        }

        Ok(())
    }

    fn within_business_hours(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let (start_day, end_day) = (start.date_naive(), end.date_naive());
        if !is_business_day(start_day) || !is_business_day(end_day) {
            return false;
        }
        // Overnight intervals would skip the closed hours in between
        if start_day != end_day {
            return false;
        }
        hour_of_day(start) >= self.rules.business_start_hour as f64
            && hour_of_day(end) <= self.rules.business_end_hour as f64
    }
}
