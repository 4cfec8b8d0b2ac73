use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, status, tickets};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Tickets
        .route("/tickets", post(tickets::create_ticket))
        .route("/tickets/redeem/{ticket}", get(tickets::redeem_ticket))
        .route(
            "/tickets/redeem-batch/{tickets}",
            get(tickets::redeem_tickets),
        )
        // Status-update intake (transport adapter in front of the ingress)
        .route("/status/{ticket}/{code}", post(status::submit_status_update))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(super::middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
