//! Notification read routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::api::server::AppState;
use crate::database::models::Notification;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{recipient_id}", get(list_notifications))
        .route("/{recipient_id}/read-all", post(mark_all_read))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub count: u64,
}

async fn list_notifications(
    State(state): State<AppState>,
    Path(recipient_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications = state
        .notification_service
        .list_for_recipient(&recipient_id, query.unread_only, query.limit)
        .await?;
    Ok(Json(notifications))
}

async fn mark_all_read(
    State(state): State<AppState>,
    Path(recipient_id): Path<String>,
) -> ApiResult<Json<MarkAllReadResponse>> {
    let count = state.notification_service.mark_all_read(&recipient_id).await?;
    Ok(Json(MarkAllReadResponse { count }))
}
