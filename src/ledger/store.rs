//! Ledger storage contract
//!
//! Backends persist accounts and bet records. `commit_settlement` is the only
//! path that writes a bet record, and it must write the account alongside it
//! in one all-or-nothing unit.

use crate::errors::StorageError;
use crate::games::types::{Account, AccountHandle, BetRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get_account(&self, handle: &AccountHandle) -> Result<Option<Account>, StorageError>;

    async fn save_account(&self, account: &Account) -> Result<(), StorageError>;

    /// Persist the updated account and its new bet record atomically
    async fn commit_settlement(&self, account: &Account, record: &BetRecord) -> Result<(), StorageError>;

    /// Bet records for `handle`, newest first, at most `limit`
    async fn query_recent(&self, handle: &AccountHandle, limit: usize) -> Result<Vec<BetRecord>, StorageError>;

    async fn get_bet(&self, bet_id: &str) -> Result<Option<BetRecord>, StorageError>;
}

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<AccountHandle, Account>,
    /// Per-account records in commit order
    history: HashMap<AccountHandle, Vec<BetRecord>>,
    bets: HashMap<String, BetRecord>,
}

/// In-process ledger backend. A single lock covers all maps, so a
/// settlement commit is observed entirely or not at all.
#[derive(Default)]
pub struct MemoryLedgerStore {
    state: RwLock<MemoryState>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StorageError {
        StorageError::ReadFailed("ledger state lock poisoned".to_string())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn get_account(&self, handle: &AccountHandle) -> Result<Option<Account>, StorageError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state.accounts.get(handle).cloned())
    }

    async fn save_account(&self, account: &Account) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        state.accounts.insert(account.handle.clone(), account.clone());
        Ok(())
    }

    async fn commit_settlement(&self, account: &Account, record: &BetRecord) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        if state.bets.contains_key(&record.bet_id) {
            return Err(StorageError::WriteFailed(format!("duplicate bet id {}", record.bet_id)));
        }
        state.accounts.insert(account.handle.clone(), account.clone());
        state
            .history
            .entry(account.handle.clone())
            .or_default()
            .push(record.clone());
        state.bets.insert(record.bet_id.clone(), record.clone());
        Ok(())
    }

    async fn query_recent(&self, handle: &AccountHandle, limit: usize) -> Result<Vec<BetRecord>, StorageError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state
            .history
            .get(handle)
            .map(|records| records.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_bet(&self, bet_id: &str) -> Result<Option<BetRecord>, StorageError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state.bets.get(bet_id).cloned())
    }
}
