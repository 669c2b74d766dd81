//! Repository layer: the persistence collaborator behind the services.
//!
//! Services only see the [`RoomStore`] and [`BookingStore`] traits. The
//! Postgres implementations live in [`rooms`] and [`bookings`]; [`memory`]
//! provides a process-local store with the same transactional guarantees.

pub mod bookings;
pub mod memory;
pub mod rooms;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        booking::{Booking, BookingFilter, BookingStatus, NewBooking},
        room::{CreateRoom, Room, RoomQuery},
    },
};

#[cfg(test)]
use mockall::automock;

/// Room persistence
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn create(&self, data: &CreateRoom) -> AppResult<Room>;

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Room>>;

    /// Rooms matching the filter, ordered by id
    async fn list(&self, query: &RoomQuery) -> AppResult<Vec<Room>>;
}

/// Booking persistence
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Booking>>;

    async fn find_by_idempotency_key(&self, room_id: i32, key: &str) -> AppResult<Option<Booking>>;

    /// One page of bookings ordered by start time, plus the unpaged total
    async fn list(&self, filter: &BookingFilter) -> AppResult<(Vec<Booking>, i64)>;

    /// Confirmed bookings of a room intersecting `[from, to)`
    async fn list_confirmed_in_range(
        &self,
        room_id: i32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>>;

    async fn update_status(&self, id: i32, status: BookingStatus) -> AppResult<Option<Booking>>;

    /// Open a unit of work. Writes made through it become visible on
    /// [`BookingUnitOfWork::commit`]; dropping it rolls them back.
    async fn begin(&self) -> AppResult<Box<dyn BookingUnitOfWork>>;
}

/// Transactional scope for the check-then-insert booking path
#[async_trait]
pub trait BookingUnitOfWork: Send {
    /// Serialize with every other unit of work touching the same room
    async fn lock_room(&mut self, room_id: i32) -> AppResult<()>;

    async fn find_by_idempotency_key(&mut self, room_id: i32, key: &str) -> AppResult<Option<Booking>>;

    /// Whether a confirmed booking of the room overlaps `[start, end)`
    async fn has_overlap(
        &mut self,
        room_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Insert a confirmed booking. Fails with `AppError::UniqueViolation`
    /// when the (room, idempotency key) pair already exists.
    async fn insert(&mut self, booking: &NewBooking) -> AppResult<Booking>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Store handle injected into the services
#[derive(Clone)]
pub struct Repository {
    /// Set when running against Postgres; used for readiness checks
    pub pool: Option<Pool<Postgres>>,
    pub rooms: Arc<dyn RoomStore>,
    pub bookings: Arc<dyn BookingStore>,
}

impl Repository {
    /// Create a repository backed by the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            rooms: Arc::new(rooms::RoomsRepository::new(pool.clone())),
            bookings: Arc::new(bookings::BookingsRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Create a repository backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::new());
        Self {
            pool: None,
            rooms: store.clone(),
            bookings: store,
        }
    }

    /// Check that the backing store answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
