//! API handlers for Roomdesk REST endpoints

pub mod bookings;
pub mod health;
pub mod openapi;
pub mod reports;
pub mod rooms;

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    routing::{get, post},
    BoxError, Router,
};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, AppState};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Rooms
        .route("/rooms", post(rooms::create_room).get(rooms::list_rooms))
        // Bookings
        .route("/bookings", post(bookings::create_booking).get(bookings::list_bookings))
        .route("/bookings/:id/cancel", post(bookings::cancel_booking))
        // Reports
        .route("/reports/room-utilization", get(reports::room_utilization))
        .with_state(state);

    let app = Router::new()
        .merge(api)
        .merge(openapi::create_openapi_router());

    with_deadline(app, timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Abort requests running past `timeout`; the dropped handler future
/// cancels any store call in flight.
fn with_deadline(router: Router, timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .layer(TimeoutLayer::new(timeout)),
    )
}

/// Render middleware failures with the regular error body
async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(err.to_string())
    }
}
