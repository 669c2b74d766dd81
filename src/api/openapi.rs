//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{bookings, health, reports, rooms};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Roomdesk API",
        version = "1.0.0",
        description = "Meeting room booking REST API"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Rooms
        rooms::create_room,
        rooms::list_rooms,
        // Bookings
        bookings::create_booking,
        bookings::list_bookings,
        bookings::cancel_booking,
        // Reports
        reports::room_utilization,
    ),
    components(
        schemas(
            // Rooms
            crate::models::room::Room,
            crate::models::room::CreateRoom,
            // Bookings
            crate::models::booking::Booking,
            crate::models::booking::BookingStatus,
            crate::models::booking::CreateBooking,
            crate::models::booking::BookingPage,
            // Reports
            crate::models::report::RoomUtilization,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room management"),
        (name = "bookings", description = "Booking management"),
        (name = "reports", description = "Utilization reports")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
