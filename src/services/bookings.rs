//! Booking workflow: creation, listing and cancellation

use chrono::{DateTime, Utc};
use validator::Validate;

use super::{cancellation::CancellationPolicy, conflict, idempotency, time_rules::TimeRules};
use crate::{
    error::{AppError, AppResult},
    models::booking::{
        Booking, BookingFilter, BookingPage, BookingQuery, BookingStatus, CreateBooking,
        NewBooking, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
    time_rules: TimeRules,
    cancellation: CancellationPolicy,
}

impl BookingsService {
    pub fn new(repository: Repository, time_rules: TimeRules, cancellation: CancellationPolicy) -> Self {
        Self {
            repository,
            time_rules,
            cancellation,
        }
    }

    /// Create a booking.
    ///
    /// The payload is validated, the room must exist, then the idempotency
    /// lookup, the overlap check and the insert run in one unit of work
    /// holding the room lock. A repeated `idempotency_key` for the same room
    /// returns the booking created the first time.
    #[tracing::instrument(skip(self, data), fields(room_id = data.room_id))]
    pub async fn create_booking(
        &self,
        data: CreateBooking,
        idempotency_key: Option<&str>,
    ) -> AppResult<Booking> {
        data.validate()?;
        self.time_rules.validate_interval(data.start_time, data.end_time)?;
        let key = idempotency::normalize_key(idempotency_key)?;

        if self.repository.rooms.get_by_id(data.room_id).await?.is_none() {
            return Err(AppError::NotFound("Unknown room".to_string()));
        }

        let new_booking = NewBooking::from_request(&data, key);
        match self.insert_exclusive(&new_booking).await {
            Err(violation @ AppError::UniqueViolation(_)) => match key {
                Some(key) => {
                    idempotency::recover_from_race(
                        self.repository.bookings.as_ref(),
                        data.room_id,
                        key,
                        violation,
                    )
                    .await
                }
                None => Err(violation),
            },
            result => result,
        }
    }

    /// Idempotency lookup, overlap check and insert under the room lock
    async fn insert_exclusive(&self, new_booking: &NewBooking) -> AppResult<Booking> {
        let room_id = new_booking.room_id;
        let mut uow = self.repository.bookings.begin().await?;
        uow.lock_room(room_id).await?;

        if let Some(key) = new_booking.idempotency_key.as_deref() {
            if let Some(existing) = idempotency::find_previous(&mut *uow, room_id, key).await? {
                return Ok(existing);
            }
        }

        conflict::ensure_room_free(&mut *uow, room_id, new_booking.start_time, new_booking.end_time)
            .await?;

        let booking = uow.insert(new_booking).await?;
        uow.commit().await?;

        tracing::info!(
            booking_id = booking.id,
            room_id,
            start = %booking.start_time,
            end = %booking.end_time,
            "Booking created"
        );
        Ok(booking)
    }

    /// List bookings with pagination, ordered by start time
    pub async fn list_bookings(&self, query: &BookingQuery) -> AppResult<BookingPage> {
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        let offset = query.offset.unwrap_or(0);

        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        if offset < 0 {
            return Err(AppError::Validation("offset must not be negative".to_string()));
        }

        let filter = BookingFilter {
            room_id: query.room_id,
            from: query.from,
            to: query.to,
            limit,
            offset,
        };
        let (items, total) = self.repository.bookings.list(&filter).await?;

        Ok(BookingPage {
            items,
            total,
            limit,
            offset,
        })
    }

    /// Cancel a booking
    pub async fn cancel_booking(&self, id: i32) -> AppResult<Booking> {
        self.cancel_booking_at(id, Utc::now()).await
    }

    /// Cancel a booking as of `now`. Cancelling twice returns the
    /// cancelled booking unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_booking_at(&self, id: i32, now: DateTime<Utc>) -> AppResult<Booking> {
        let booking = self
            .repository
            .bookings
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if booking.status == BookingStatus::Cancelled {
            return Ok(booking);
        }

        self.cancellation.check(&booking, now)?;

        let cancelled = self
            .repository
            .bookings
            .update_status(id, BookingStatus::Cancelled)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        tracing::info!(booking_id = id, room_id = cancelled.room_id, "Booking cancelled");
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::BookingRules,
        models::room::CreateRoom,
        repository::{MockBookingStore, MockRoomStore},
        services::Services,
    };
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn monday(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 3, 4, h, m, 0).unwrap()
    }

    async fn setup() -> (Services, i32) {
        let services = Services::new(Repository::in_memory(), BookingRules::default());
        let room = services
            .rooms
            .create_room(CreateRoom {
                name: "Room A".into(),
                capacity: 4,
                floor: Some(1),
                amenities: vec!["tv".into()],
            })
            .await
            .unwrap();
        (services, room.id)
    }

    fn request(room_id: i32, start: DateTime<Utc>, end: DateTime<Utc>) -> CreateBooking {
        CreateBooking {
            room_id,
            title: "Team meeting".into(),
            organizer_email: "me@example.com".into(),
            start_time: start,
            end_time: end,
        }
    }

    #[tokio::test]
    async fn test_create_then_overlap_conflicts() {
        let (services, room_id) = setup().await;
        let payload = request(room_id, monday(9, 0), monday(10, 0));

        let booking = services.bookings.create_booking(payload.clone(), None).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(booking.end_time > booking.start_time);

        let err = services.bookings.create_booking(payload, None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_touching_bookings_are_allowed() {
        let (services, room_id) = setup().await;
        services
            .bookings
            .create_booking(request(room_id, monday(9, 0), monday(10, 0)), None)
            .await
            .unwrap();
        services
            .bookings
            .create_booking(request(room_id, monday(10, 0), monday(11, 0)), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_room_is_not_found() {
        let (services, room_id) = setup().await;
        let err = services
            .bookings
            .create_booking(request(room_id + 100, monday(9, 0), monday(10, 0)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Unknown room"));
    }

    #[tokio::test]
    async fn test_invalid_interval_checked_before_room() {
        let (services, room_id) = setup().await;
        let err = services
            .bookings
            .create_booking(request(room_id + 100, monday(9, 0), monday(9, 5)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected() {
        let (services, room_id) = setup().await;
        let mut payload = request(room_id, monday(9, 0), monday(10, 0));
        payload.organizer_email = "not-an-email".into();
        let err = services.bookings.create_booking(payload, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_idempotent_replay_returns_original() {
        let (services, room_id) = setup().await;
        let first = services
            .bookings
            .create_booking(request(room_id, monday(9, 0), monday(10, 0)), Some("abc"))
            .await
            .unwrap();

        // Different payload, same key: the key wins
        let mut changed = request(room_id, monday(14, 0), monday(15, 0));
        changed.title = "Other".into();
        let second = services.bookings.create_booking(changed, Some("abc")).await.unwrap();
        assert_eq!(first, second);

        let page = services.bookings.list_bookings(&BookingQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_same_key_in_other_room_is_independent() {
        let (services, room_id) = setup().await;
        let other = services
            .rooms
            .create_room(CreateRoom {
                name: "Room B".into(),
                capacity: 2,
                floor: None,
                amenities: vec![],
            })
            .await
            .unwrap();

        let a = services
            .bookings
            .create_booking(request(room_id, monday(9, 0), monday(10, 0)), Some("k"))
            .await
            .unwrap();
        let b = services
            .bookings
            .create_booking(request(other.id, monday(9, 0), monday(10, 0)), Some("k"))
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_concurrent_idempotent_creations_persist_one_row() {
        let (services, room_id) = setup().await;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let services = services.clone();
            handles.push(tokio::spawn(async move {
                services
                    .bookings
                    .create_booking(request(room_id, monday(9, 0), monday(10, 0)), Some("retry-1"))
                    .await
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);

        let page = services.bookings.list_bookings(&BookingQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_concurrent_overlapping_creations_admit_one() {
        let (services, room_id) = setup().await;
        let mut handles = Vec::new();
        for i in 0..6 {
            let services = services.clone();
            let start = monday(9, 0) + Duration::minutes(i * 5);
            handles.push(tokio::spawn(async move {
                services
                    .bookings
                    .create_booking(request(room_id, start, start + Duration::hours(1)), None)
                    .await
            }));
        }

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::Conflict(_)) => conflicts += 1,
                Err(e) => panic!("unexpected error: {:?}", e),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(conflicts, 5);
    }

    #[tokio::test]
    async fn test_cancelled_booking_frees_the_slot() {
        let (services, room_id) = setup().await;
        let booking = services
            .bookings
            .create_booking(request(room_id, monday(9, 0), monday(10, 0)), None)
            .await
            .unwrap();
        services
            .bookings
            .cancel_booking_at(booking.id, monday(7, 0))
            .await
            .unwrap();
        services
            .bookings
            .create_booking(request(room_id, monday(9, 30), monday(10, 30)), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancellation_cutoff_and_idempotence() {
        let (services, room_id) = setup().await;
        let booking = services
            .bookings
            .create_booking(request(room_id, monday(9, 0), monday(10, 0)), None)
            .await
            .unwrap();

        let err = services
            .bookings
            .cancel_booking_at(booking.id, monday(8, 30))
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::Validation(ref m) if m == "Cancellation allowed up to 1 hour before start")
        );

        let cancelled = services
            .bookings
            .cancel_booking_at(booking.id, monday(8, 0))
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        // Already cancelled: returned unchanged even inside the cutoff
        let again = services
            .bookings
            .cancel_booking_at(booking.id, monday(9, 30))
            .await
            .unwrap();
        assert_eq!(again, cancelled);
    }

    #[tokio::test]
    async fn test_cancel_missing_booking() {
        let (services, _) = setup().await;
        let err = services.bookings.cancel_booking(404).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_listing_filters_and_pages() {
        let (services, room_id) = setup().await;
        for h in [13, 9, 11] {
            services
                .bookings
                .create_booking(request(room_id, monday(h, 0), monday(h + 1, 0)), None)
                .await
                .unwrap();
        }

        let page = services
            .bookings
            .list_bookings(&BookingQuery {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].start_time, monday(9, 0));
        assert_eq!(page.items[1].start_time, monday(11, 0));

        let page = services
            .bookings
            .list_bookings(&BookingQuery {
                from: Some(monday(10, 0)),
                to: Some(monday(13, 0)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].start_time, monday(11, 0));
        assert_eq!(page.limit, 20);
        assert_eq!(page.offset, 0);
    }

    #[tokio::test]
    async fn test_listing_rejects_bad_paging() {
        let (services, _) = setup().await;
        for query in [
            BookingQuery { limit: Some(0), ..Default::default() },
            BookingQuery { limit: Some(MAX_PAGE_LIMIT + 1), ..Default::default() },
            BookingQuery { offset: Some(-1), ..Default::default() },
        ] {
            let err = services.bookings.list_bookings(&query).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let mut rooms = MockRoomStore::new();
        rooms
            .expect_get_by_id()
            .returning(|_| Err(AppError::Database(sqlx::Error::PoolTimedOut)));
        let mut bookings = MockBookingStore::new();
        bookings.expect_begin().never();

        let repository = Repository {
            pool: None,
            rooms: Arc::new(rooms),
            bookings: Arc::new(bookings),
        };
        let services = Services::new(repository, BookingRules::default());

        let err = services
            .bookings
            .create_booking(request(1, monday(9, 0), monday(10, 0)), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InternalError);
    }

    /// Unit of work that loses the insert race on the (room, key) constraint
    struct LosingUnitOfWork;

    #[async_trait::async_trait]
    impl crate::repository::BookingUnitOfWork for LosingUnitOfWork {
        async fn lock_room(&mut self, _room_id: i32) -> AppResult<()> {
            Ok(())
        }

        async fn find_by_idempotency_key(&mut self, _room_id: i32, _key: &str) -> AppResult<Option<Booking>> {
            Ok(None)
        }

        async fn has_overlap(
            &mut self,
            _room_id: i32,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> AppResult<bool> {
            Ok(false)
        }

        async fn insert(&mut self, _booking: &NewBooking) -> AppResult<Booking> {
            Err(AppError::UniqueViolation("bookings_room_id_idempotency_key_key".into()))
        }

        async fn commit(self: Box<Self>) -> AppResult<()> {
            panic!("a failed insert must not be committed");
        }
    }

    #[tokio::test]
    async fn test_unique_violation_on_key_returns_existing_booking() {
        let existing = Booking {
            id: 41,
            room_id: 1,
            title: "Team meeting".into(),
            organizer_email: "me@example.com".into(),
            start_time: monday(9, 0),
            end_time: monday(10, 0),
            status: BookingStatus::Confirmed,
            idempotency_key: Some("retry-1".into()),
            created_at: Utc::now(),
        };

        let mut rooms = MockRoomStore::new();
        rooms.expect_get_by_id().returning(|id| {
            Ok(Some(crate::models::room::Room {
                id,
                name: "Room A".into(),
                capacity: 4,
                floor: None,
                amenities: vec![],
                created_at: Utc::now(),
            }))
        });

        let mut bookings = MockBookingStore::new();
        bookings
            .expect_begin()
            .times(1)
            .returning(|| Ok(Box::new(LosingUnitOfWork) as Box<dyn crate::repository::BookingUnitOfWork>));
        let row = existing.clone();
        bookings
            .expect_find_by_idempotency_key()
            .withf(|room_id, key| *room_id == 1 && key == "retry-1")
            .times(1)
            .returning(move |_, _| Ok(Some(row.clone())));

        let repository = Repository {
            pool: None,
            rooms: Arc::new(rooms),
            bookings: Arc::new(bookings),
        };
        let services = Services::new(repository, BookingRules::default());

        let booking = services
            .bookings
            .create_booking(request(1, monday(9, 0), monday(10, 0)), Some("retry-1"))
            .await
            .unwrap();
        assert_eq!(booking, existing);
    }

    #[tokio::test]
    async fn test_unique_violation_without_key_is_conflict() {
        let mut rooms = MockRoomStore::new();
        rooms.expect_get_by_id().returning(|id| {
            Ok(Some(crate::models::room::Room {
                id,
                name: "Room A".into(),
                capacity: 4,
                floor: None,
                amenities: vec![],
                created_at: Utc::now(),
            }))
        });

        let mut bookings = MockBookingStore::new();
        bookings
            .expect_begin()
            .returning(|| Ok(Box::new(LosingUnitOfWork) as Box<dyn crate::repository::BookingUnitOfWork>));
        bookings.expect_find_by_idempotency_key().never();

        let repository = Repository {
            pool: None,
            rooms: Arc::new(rooms),
            bookings: Arc::new(bookings),
        };
        let services = Services::new(repository, BookingRules::default());

        let err = services
            .bookings
            .create_booking(request(1, monday(9, 0), monday(10, 0)), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Conflict);
    }
}
