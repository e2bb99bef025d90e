//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Account endpoints (identity from x-account-handle)
        .route("/api/account", post(open_account_handler))
        .route("/api/me", get(profile_handler))
        // Betting
        .route("/api/game/bet", post(place_bet_handler))
        .route("/api/bets", get(history_handler))
        .route("/api/bets/:bet_id", get(bet_detail_handler))
        // Administrative credit
        .route("/api/admin/topup", post(topup_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
