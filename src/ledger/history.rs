//! Read-only view over settled bets

use crate::{
    config::GameConfig,
    errors::BetError,
    games::types::{AccountHandle, BetRecord},
    ledger::store::LedgerStore,
};
use std::sync::Arc;

pub struct BetHistory {
    store: Arc<dyn LedgerStore>,
    default_limit: usize,
    max_limit: usize,
}

impl BetHistory {
    pub fn new(store: Arc<dyn LedgerStore>, config: &GameConfig) -> Self {
        Self {
            store,
            default_limit: config.default_history_limit,
            max_limit: config.max_history_limit,
        }
    }

    /// Zero means "use the default"; anything above the maximum is capped
    pub fn effective_limit(&self, limit: usize) -> usize {
        match limit {
            0 => self.default_limit,
            n => n.min(self.max_limit),
        }
    }

    /// Newest first, bounded by `limit`
    pub async fn recent(&self, handle: &AccountHandle, limit: usize) -> Result<Vec<BetRecord>, BetError> {
        let limit = self.effective_limit(limit);
        Ok(self.store.query_recent(handle, limit).await?)
    }

    /// A single bet, visible only to the account that placed it
    pub async fn bet(&self, handle: &AccountHandle, bet_id: &str) -> Result<Option<BetRecord>, BetError> {
        let record = self.store.get_bet(bet_id).await?;
        Ok(record.filter(|r| &r.account == handle))
    }
}
