//! API route modules.

pub mod campaigns;
pub mod health;
pub mod notifications;
pub mod realtime;

use axum::Router;

use crate::api::server::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/campaigns", campaigns::router())
        .nest("/api/notifications", notifications::router())
        .nest("/health", health::router())
        .merge(realtime::router())
        .with_state(state)
}
