//! Room utilization reporting

use chrono::{DateTime, NaiveTime, TimeZone, Utc};

use super::time_rules::{is_business_day, TimeRules};
use crate::{
    error::AppResult,
    models::{report::RoomUtilization, room::RoomQuery},
    repository::Repository,
};

/// Whole minutes of `[s1, e1) ∩ [s2, e2)` expressed in hours
pub fn intersection_hours(
    s1: DateTime<Utc>,
    e1: DateTime<Utc>,
    s2: DateTime<Utc>,
    e2: DateTime<Utc>,
) -> f64 {
    let start = s1.max(s2);
    let end = e1.min(e2);
    if end > start {
        (end - start).num_minutes() as f64 / 60.0
    } else {
        0.0
    }
}

/// Business hours available in `[from, to)`: for every Monday to Friday
/// touched by the range, its business window clipped to the range.
pub fn business_hours_in_range(rules: &TimeRules, from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let mut total = 0.0;
    let mut day = from.date_naive();
    while Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN)) < to {
        if is_business_day(day) {
            let (open, close) = rules.business_window(day);
            total += intersection_hours(open, close, from, to);
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    total
}

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
    time_rules: TimeRules,
}

impl ReportsService {
    pub fn new(repository: Repository, time_rules: TimeRules) -> Self {
        Self { repository, time_rules }
    }

    /// Booked hours and utilization of every room over `[from, to)`
    #[tracing::instrument(skip(self))]
    pub async fn room_utilization(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<RoomUtilization>> {
        let available = business_hours_in_range(&self.time_rules, from, to);
        let rooms = self.repository.rooms.list(&RoomQuery::default()).await?;

        let mut report = Vec::with_capacity(rooms.len());
        for room in rooms {
            let bookings = self
                .repository
                .bookings
                .list_confirmed_in_range(room.id, from, to)
                .await?;

            // fold from +0.0: an empty f64 sum is -0.0
            let booked = bookings.iter().fold(0.0, |acc, b| {
                acc + intersection_hours(b.start_time, b.end_time, from, to)
            });

            report.push(RoomUtilization {
                room_id: room.id,
                room_name: room.name,
                total_booking_hours: booked,
                utilization_percent: if available > 0.0 { booked / available } else { 0.0 },
            });
        }

        tracing::debug!(rooms = report.len(), available_hours = available, "Computed utilization");
        Ok(report)
    }
}
