//! Reporting endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::WithRejection;

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::report::{RoomUtilization, UtilizationQuery},
};

/// Per-room utilization over a date range
#[utoipa::path(
    get,
    path = "/reports/room-utilization",
    tag = "reports",
    params(UtilizationQuery),
    responses(
        (status = 200, description = "Utilization of every room", body = Vec<RoomUtilization>),
        (status = 400, description = "Missing or invalid from/to", body = ErrorResponse)
    )
)]
pub async fn room_utilization(
    State(state): State<crate::AppState>,
    WithRejection(Query(query), _): WithRejection<Query<UtilizationQuery>, AppError>,
) -> AppResult<Json<Vec<RoomUtilization>>> {
    let (Some(from), Some(to)) = (query.from, query.to) else {
        return Err(AppError::Validation(
            "Missing from or to query params".to_string(),
        ));
    };

    let report = state.services.reports.room_utilization(from, to).await?;
    Ok(Json(report))
}
