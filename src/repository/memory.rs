//! In-memory store.
//!
//! A single async mutex guards all state. A unit of work holds that mutex
//! for its whole lifetime and writes into a working copy that replaces the
//! shared state on commit, so check-then-insert sequences are serialized
//! exactly as the Postgres advisory lock serializes them per room.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{BookingStore, BookingUnitOfWork, RoomStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{Booking, BookingFilter, BookingStatus, NewBooking},
        room::{CreateRoom, Room, RoomQuery},
    },
    services::conflict::overlaps,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    rooms: Vec<Room>,
    bookings: Vec<Booking>,
    next_room_id: i32,
    next_booking_id: i32,
}

impl MemoryState {
    fn find_by_key(&self, room_id: i32, key: &str) -> Option<&Booking> {
        self.bookings
            .iter()
            .find(|b| b.room_id == room_id && b.idempotency_key.as_deref() == Some(key))
    }

    fn has_overlap(&self, room_id: i32, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.bookings.iter().any(|b| {
            b.room_id == room_id && b.is_confirmed() && overlaps(b.start_time, b.end_time, start, end)
        })
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn create(&self, data: &CreateRoom) -> AppResult<Room> {
        let mut state = self.state.lock().await;
        state.next_room_id += 1;
        let room = Room {
            id: state.next_room_id,
            name: data.name.clone(),
            capacity: data.capacity,
            floor: data.floor,
            amenities: data.unique_amenities(),
            created_at: Utc::now(),
        };
        state.rooms.push(room.clone());
        Ok(room)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Room>> {
        let state = self.state.lock().await;
        Ok(state.rooms.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, query: &RoomQuery) -> AppResult<Vec<Room>> {
        let state = self.state.lock().await;
        Ok(state.rooms.iter().filter(|r| query.matches(r)).cloned().collect())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Booking>> {
        let state = self.state.lock().await;
        Ok(state.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn find_by_idempotency_key(&self, room_id: i32, key: &str) -> AppResult<Option<Booking>> {
        let state = self.state.lock().await;
        Ok(state.find_by_key(room_id, key).cloned())
    }

    async fn list(&self, filter: &BookingFilter) -> AppResult<(Vec<Booking>, i64)> {
        let state = self.state.lock().await;
        let mut matching: Vec<&Booking> = state.bookings.iter().filter(|b| filter.matches(b)).collect();
        matching.sort_by_key(|b| (b.start_time, b.id));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn list_confirmed_in_range(
        &self,
        room_id: i32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Booking> = state
            .bookings
            .iter()
            .filter(|b| {
                b.room_id == room_id && b.is_confirmed() && overlaps(b.start_time, b.end_time, from, to)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|b| b.start_time);
        Ok(rows)
    }

    async fn update_status(&self, id: i32, status: BookingStatus) -> AppResult<Option<Booking>> {
        let mut state = self.state.lock().await;
        Ok(state.bookings.iter_mut().find(|b| b.id == id).map(|b| {
            b.status = status;
            b.clone()
        }))
    }

    async fn begin(&self) -> AppResult<Box<dyn BookingUnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }
}

/// Unit of work holding the store lock until commit or drop
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl BookingUnitOfWork for MemoryUnitOfWork {
    async fn lock_room(&mut self, _room_id: i32) -> AppResult<()> {
        // The whole store is already held
        Ok(())
    }

    async fn find_by_idempotency_key(&mut self, room_id: i32, key: &str) -> AppResult<Option<Booking>> {
        Ok(self.working.find_by_key(room_id, key).cloned())
    }

    async fn has_overlap(
        &mut self,
        room_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self.working.has_overlap(room_id, start, end))
    }

    async fn insert(&mut self, booking: &NewBooking) -> AppResult<Booking> {
        if booking.end_time <= booking.start_time {
            return Err(AppError::Validation("startTime must be before endTime".to_string()));
        }
        if !self.working.rooms.iter().any(|r| r.id == booking.room_id) {
            return Err(AppError::NotFound("Unknown room".to_string()));
        }
        if let Some(key) = booking.idempotency_key.as_deref() {
            if self.working.find_by_key(booking.room_id, key).is_some() {
                return Err(AppError::UniqueViolation(
                    "bookings_room_id_idempotency_key_key".to_string(),
                ));
            }
        }

        self.working.next_booking_id += 1;
        let row = Booking {
            id: self.working.next_booking_id,
            room_id: booking.room_id,
            title: booking.title.clone(),
            organizer_email: booking.organizer_email.clone(),
            start_time: booking.start_time,
            end_time: booking.end_time,
            status: BookingStatus::Confirmed,
            idempotency_key: booking.idempotency_key.clone(),
            created_at: Utc::now(),
        };
        self.working.bookings.push(row.clone());
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
