//! Room management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::room::{CreateRoom, Room, RoomQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct RoomsService {
    repository: Repository,
}

impl RoomsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a new room
    pub async fn create_room(&self, data: CreateRoom) -> AppResult<Room> {
        data.validate()
            .map_err(|e| AppError::from_validation(e, CreateRoom::FIELD_ORDER))?;
        let room = self.repository.rooms.create(&data).await?;
        tracing::info!(room_id = room.id, name = %room.name, "Room created");
        Ok(room)
    }

    /// List rooms matching the capacity / amenity filter
    pub async fn list_rooms(&self, query: &RoomQuery) -> AppResult<Vec<Room>> {
        self.repository.rooms.list(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_name_error_reported_before_capacity() {
        let service = RoomsService::new(Repository::in_memory());
        let err = service
            .create_room(CreateRoom {
                name: String::new(),
                capacity: 0,
                floor: None,
                amenities: vec![],
            })
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => assert_eq!(msg, "name is required"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_room_dedupes_amenities() {
        let service = RoomsService::new(Repository::in_memory());
        let room = service
            .create_room(CreateRoom {
                name: "Atlas".into(),
                capacity: 6,
                floor: Some(3),
                amenities: vec!["tv".into(), "tv".into(), "phone".into()],
            })
            .await
            .unwrap();
        assert_eq!(room.amenities, vec!["tv".to_string(), "phone".to_string()]);

        let listed = service.list_rooms(&RoomQuery::default()).await.unwrap();
        assert_eq!(listed, vec![room]);
    }
}
