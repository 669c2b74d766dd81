//! Business logic services

pub mod bookings;
pub mod cancellation;
pub mod conflict;
pub mod idempotency;
pub mod reports;
pub mod rooms;
pub mod time_rules;

use crate::{config::BookingRules, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub rooms: rooms::RoomsService,
    pub bookings: bookings::BookingsService,
    pub reports: reports::ReportsService,
    pub repository: Repository,
}

impl Services {
    /// Create all services over the given repository
    pub fn new(repository: Repository, rules: BookingRules) -> Self {
        let time_rules = time_rules::TimeRules::new(rules.clone());
        let cancellation = cancellation::CancellationPolicy::new(rules.cancellation_cutoff_minutes);

        Self {
            rooms: rooms::RoomsService::new(repository.clone()),
            bookings: bookings::BookingsService::new(repository.clone(), time_rules.clone(), cancellation),
            reports: reports::ReportsService::new(repository.clone(), time_rules),
            repository,
        }
    }
}
