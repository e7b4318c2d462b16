//! Campaign routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};

use crate::api::error::ApiResult;
use crate::api::server::AppState;
use crate::campaign::ExecutionSummary;

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/execute", post(execute_campaign))
}

/// Execute a campaign now, regardless of its start date.
async fn execute_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ExecutionSummary>> {
    let summary = state.executor.execute(&id).await?;
    Ok(Json(summary))
}
