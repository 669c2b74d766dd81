//! Rooms repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::RoomStore;
use crate::{
    error::AppResult,
    models::room::{CreateRoom, Room, RoomQuery},
};

#[derive(Clone)]
pub struct RoomsRepository {
    pool: Pool<Postgres>,
}

impl RoomsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomStore for RoomsRepository {
    /// Create a room
    async fn create(&self, data: &CreateRoom) -> AppResult<Room> {
        let room = sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (name, capacity, floor, amenities)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(data.capacity)
        .bind(data.floor)
        .bind(data.unique_amenities())
        .fetch_one(&self.pool)
        .await?;
        Ok(room)
    }

    /// Get room by ID
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(room)
    }

    /// List rooms, optionally filtered by capacity and amenity
    async fn list(&self, query: &RoomQuery) -> AppResult<Vec<Room>> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.min_capacity.is_some() {
            conditions.push(format!("capacity >= ${}", idx));
            idx += 1;
        }
        if query.amenity.is_some() {
            conditions.push(format!("${} = ANY(amenities)", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!("SELECT * FROM rooms {} ORDER BY id", where_clause);

        let mut builder = sqlx::query_as::<_, Room>(&sql);
        if let Some(min) = query.min_capacity {
            builder = builder.bind(min);
        }
        if let Some(ref amenity) = query.amenity {
            builder = builder.bind(amenity);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows)
    }
}
