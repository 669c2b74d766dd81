//! Bookings repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction};

use super::{BookingStore, BookingUnitOfWork};
use crate::{
    error::AppResult,
    models::booking::{Booking, BookingFilter, BookingStatus, NewBooking},
};

/// Advisory lock class for per-room booking locks
const ROOM_LOCK_NAMESPACE: i32 = 0x524f_4f4d;

const OVERLAP_SQL: &str = r#"
    SELECT EXISTS(
        SELECT 1 FROM bookings
        WHERE room_id = $1
          AND status = 'CONFIRMED'
          AND start_time < $3
          AND end_time > $2
    )
"#;

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Build the WHERE clause shared by the page and count queries
    fn filter_clause(filter: &BookingFilter) -> String {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if filter.room_id.is_some() {
            conditions.push(format!("room_id = ${}", idx));
            idx += 1;
        }
        if filter.from.is_some() {
            conditions.push(format!("end_time > ${}", idx));
            idx += 1;
        }
        if filter.to.is_some() {
            conditions.push(format!("start_time < ${}", idx));
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        }
    }
}

#[async_trait]
impl BookingStore for BookingsRepository {
    /// Get booking by ID
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(booking)
    }

    async fn find_by_idempotency_key(&self, room_id: i32, key: &str) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE room_id = $1 AND idempotency_key = $2",
        )
        .bind(room_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(booking)
    }

    /// List bookings with pagination
    async fn list(&self, filter: &BookingFilter) -> AppResult<(Vec<Booking>, i64)> {
        let where_clause = Self::filter_clause(filter);

        let count_sql = format!("SELECT COUNT(*) FROM bookings {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(room_id) = filter.room_id {
            count_builder = count_builder.bind(room_id);
        }
        if let Some(from) = filter.from {
            count_builder = count_builder.bind(from);
        }
        if let Some(to) = filter.to {
            count_builder = count_builder.bind(to);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let page_sql = format!(
            "SELECT * FROM bookings {} ORDER BY start_time, id LIMIT {} OFFSET {}",
            where_clause, filter.limit, filter.offset
        );
        let mut builder = sqlx::query_as::<_, Booking>(&page_sql);
        if let Some(room_id) = filter.room_id {
            builder = builder.bind(room_id);
        }
        if let Some(from) = filter.from {
            builder = builder.bind(from);
        }
        if let Some(to) = filter.to {
            builder = builder.bind(to);
        }
        let items = builder.fetch_all(&self.pool).await?;

        Ok((items, total))
    }

    async fn list_confirmed_in_range(
        &self,
        room_id: i32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE room_id = $1
              AND status = 'CONFIRMED'
              AND start_time < $3
              AND end_time > $2
            ORDER BY start_time
            "#,
        )
        .bind(room_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_status(&self, id: i32, status: BookingStatus) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(booking)
    }

    async fn begin(&self) -> AppResult<Box<dyn BookingUnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgBookingTransaction { tx }))
    }
}

/// Booking unit of work over a Postgres transaction.
/// sqlx rolls the transaction back if it is dropped uncommitted.
pub struct PgBookingTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingUnitOfWork for PgBookingTransaction {
    async fn lock_room(&mut self, room_id: i32) -> AppResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(ROOM_LOCK_NAMESPACE)
            .bind(room_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn find_by_idempotency_key(&mut self, room_id: i32, key: &str) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE room_id = $1 AND idempotency_key = $2",
        )
        .bind(room_id)
        .bind(key)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(booking)
    }

    async fn has_overlap(
        &mut self,
        room_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(OVERLAP_SQL)
            .bind(room_id)
            .bind(start)
            .bind(end)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(exists)
    }

    async fn insert(&mut self, booking: &NewBooking) -> AppResult<Booking> {
        let row = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (room_id, title, organizer_email, start_time, end_time, status, idempotency_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(booking.room_id)
        .bind(&booking.title)
        .bind(&booking.organizer_email)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(BookingStatus::Confirmed)
        .bind(&booking.idempotency_key)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
