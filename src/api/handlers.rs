//! Request Handlers
//!
//! Thin adapters between HTTP and the settlement core. Identity comes from
//! the `x-account-handle` header; handlers never trust a handle in the body
//! except on the administrative top-up.

use super::{
    errors::ApiError,
    middleware::{admin_token_matches, AuthenticatedAccount, RequestId, ADMIN_TOKEN_HEADER},
    models::*,
};
use crate::{
    config::TaixiuConfig,
    errors::{BetError, ValidationError},
    games::{
        draw::DrawSource,
        processor::BetProcessor,
        types::{AccountHandle, BetReceipt, BetRecord, BetTicket, PlaceBetRequest},
    },
    ledger::{AccountLedger, BetHistory, LedgerStore},
    metrics::BetMetrics,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub processor: Arc<BetProcessor>,
    pub ledger: Arc<AccountLedger>,
    pub history: Arc<BetHistory>,
    pub metrics: Arc<BetMetrics>,
    pub metrics_enabled: bool,
    /// Administrative endpoints are disabled when unset
    pub admin_token: Option<String>,
    pub version: String,
}

impl AppState {
    /// Wire the ledger, history, and processor over one store
    pub fn new(config: &TaixiuConfig, store: Arc<dyn LedgerStore>, draw: Arc<dyn DrawSource>) -> Self {
        let metrics = Arc::new(BetMetrics::new());
        let ledger = Arc::new(AccountLedger::new(store.clone(), config.game.start_balance));
        let history = Arc::new(BetHistory::new(store, &config.game));
        let processor = Arc::new(BetProcessor::new(ledger.clone(), draw, metrics.clone()));

        Self {
            processor,
            ledger,
            history,
            metrics,
            metrics_enabled: config.monitoring.enable_metrics,
            admin_token: config.server.admin_token.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
    })
}

/// Open an account for the authenticated handle
/// POST /api/account
pub async fn open_account_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    AuthenticatedAccount(handle): AuthenticatedAccount,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let account = state
        .ledger
        .open_account(&handle)
        .await
        .map_err(|e| ApiError::bet(request_id.0, e))?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}

/// Balance plus the most recent bets
/// GET /api/me
pub async fn profile_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    AuthenticatedAccount(handle): AuthenticatedAccount,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = state
        .ledger
        .get_account(&handle)
        .await
        .map_err(|e| ApiError::bet(request_id.0.clone(), e))?;

    let last_bets = state
        .history
        .recent(&handle, 0)
        .await
        .map_err(|e| ApiError::bet(request_id.0, e))?;

    Ok(Json(ProfileResponse {
        handle: account.handle.to_string(),
        balance: account.balance,
        last_bets,
    }))
}

/// Place and settle one bet
/// POST /api/game/bet
pub async fn place_bet_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    AuthenticatedAccount(handle): AuthenticatedAccount,
    body: Result<Json<PlaceBetRequest>, JsonRejection>,
) -> Result<Json<BetReceipt>, ApiError> {
    let ticket = body
        .map_err(|rejection| ValidationError::Malformed(rejection.body_text()))
        .and_then(|Json(request)| BetTicket::from_request(&request))
        .map_err(|e| {
            let error = BetError::from(e);
            state.metrics.record_rejection(&error);
            tracing::debug!(account = %handle, request_id = %request_id.0, "Bet request rejected: {}", error);
            ApiError::bet(request_id.0.clone(), error)
        })?;

    let receipt = state
        .processor
        .place_bet(&handle, ticket)
        .await
        .map_err(|e| ApiError::bet(request_id.0, e))?;

    Ok(Json(receipt))
}

/// Newest-first bet history for the authenticated account
/// GET /api/bets?limit=N
pub async fn history_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    AuthenticatedAccount(handle): AuthenticatedAccount,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        ApiError::bet(request_id.0.clone(), ValidationError::Malformed(rejection.body_text()).into())
    })?;
    let limit = state.history.effective_limit(query.limit.unwrap_or(0));
    let bets = state
        .history
        .recent(&handle, limit)
        .await
        .map_err(|e| ApiError::bet(request_id.0, e))?;

    Ok(Json(HistoryResponse { bets, limit }))
}

/// A single bet owned by the authenticated account
/// GET /api/bets/:bet_id
pub async fn bet_detail_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    AuthenticatedAccount(handle): AuthenticatedAccount,
    Path(bet_id): Path<String>,
) -> Result<Json<BetRecord>, ApiError> {
    let record = state
        .history
        .bet(&handle, &bet_id)
        .await
        .map_err(|e| ApiError::bet(request_id.0.clone(), e))?;

    record
        .map(Json)
        .ok_or_else(|| ApiError::not_found(request_id.0, format!("Bet {} not found", bet_id)))
}

/// Administrative credit, gated by a shared token
/// POST /api/admin/topup
pub async fn topup_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<TopUpRequest>, JsonRejection>,
) -> Result<Json<TopUpResponse>, ApiError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(ApiError::not_found(request_id.0, "Not found".to_string()));
    };

    let presented = headers.get(ADMIN_TOKEN_HEADER).and_then(|v| v.to_str().ok());
    if !admin_token_matches(expected, presented) {
        tracing::warn!(request_id = %request_id.0, "Rejected top-up with a bad admin token");
        return Err(ApiError::unauthorized(request_id.0, "Unauthorized".to_string()));
    }

    // The body is only inspected once the caller is authorized
    let Json(request) = body.map_err(|rejection| {
        ApiError::bet(request_id.0.clone(), ValidationError::Malformed(rejection.body_text()).into())
    })?;
    let handle = AccountHandle::parse(&request.account).map_err(|e| ApiError::bet(request_id.0.clone(), e.into()))?;
    let account = state
        .ledger
        .top_up(&handle, request.amount)
        .await
        .map_err(|e| ApiError::bet(request_id.0, e))?;

    Ok(Json(TopUpResponse {
        account: account.handle.to_string(),
        balance: account.balance,
    }))
}

/// Prometheus text exposition
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    if !state.metrics_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.to_prometheus_format(),
    )
        .into_response()
}
