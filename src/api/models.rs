//! API Request and Response Models

use crate::games::types::{Account, BetRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Account summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub handle: String,
    pub balance: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            handle: account.handle.to_string(),
            balance: account.balance,
            created_at: account.created_at,
        }
    }
}

/// Profile with the most recent bets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub handle: String,
    pub balance: u64,
    pub last_bets: Vec<BetRecord>,
}

/// Bet history page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub bets: Vec<BetRecord>,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Administrative credit request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUpRequest {
    pub account: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUpResponse {
    pub account: String,
    pub balance: u64,
}
