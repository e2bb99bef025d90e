//! Persistent ledger stored in RocksDB.
//!
//! Key layout:
//! - `account:{handle}` -> Account (JSON)
//! - `bet:record:{bet_id}` -> BetRecord (JSON)
//! - `bet:history:{handle}\0{inv_seq}` -> BetRecord (JSON), newest first under a forward scan

use crate::{
    config::StorageConfig,
    errors::StorageError,
    games::types::{Account, AccountHandle, BetRecord},
    ledger::store::LedgerStore,
    storage::OptimizedStorage,
};
use async_trait::async_trait;
use std::sync::Arc;

const ACCOUNT_PREFIX: &str = "account:";
const BET_RECORD_PREFIX: &str = "bet:record:";
const BET_HISTORY_PREFIX: &str = "bet:history:";

fn account_key(handle: &AccountHandle) -> Vec<u8> {
    format!("{}{}", ACCOUNT_PREFIX, handle).into_bytes()
}

fn bet_record_key(bet_id: &str) -> Vec<u8> {
    format!("{}{}", BET_RECORD_PREFIX, bet_id).into_bytes()
}

fn history_prefix(handle: &AccountHandle) -> Vec<u8> {
    // Handles never contain NUL, so one account's prefix cannot match another's
    let mut key = format!("{}{}", BET_HISTORY_PREFIX, handle).into_bytes();
    key.push(0);
    key
}

fn history_key(handle: &AccountHandle, sequence: u64) -> Vec<u8> {
    // Inverted sequence so the newest record sorts first.
    // Key layout: prefix | inv_seq(be)
    let mut key = history_prefix(handle);
    key.extend_from_slice(&(u64::MAX - sequence).to_be_bytes());
    key
}

#[derive(Clone)]
pub struct RocksLedgerStore {
    storage: Arc<OptimizedStorage>,
}

impl RocksLedgerStore {
    pub fn new(storage: Arc<OptimizedStorage>) -> Self {
        Self { storage }
    }

    /// Open (or create) the database described by `config`
    pub fn open(config: &StorageConfig) -> Result<Self, StorageError> {
        let storage = OptimizedStorage::new_with_config(config).map_err(|e| {
            StorageError::DatabaseOpenFailed(format!("{}: {}", config.data_directory, e))
        })?;
        Ok(Self::new(Arc::new(storage)))
    }

    fn load<T: serde::de::DeserializeOwned>(&self, key: &[u8], what: &str) -> Result<Option<T>, StorageError> {
        let Some(bytes) = self
            .storage
            .get(key)
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?
        else {
            return Ok(None);
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            StorageError::CorruptedData(format!("Failed to decode {}: {}", what, e))
        })
    }

    fn encode<T: serde::Serialize>(value: &T, what: &str) -> Result<Vec<u8>, StorageError> {
        serde_json::to_vec(value)
            .map_err(|e| StorageError::WriteFailed(format!("Failed to encode {}: {}", what, e)))
    }
}

#[async_trait]
impl LedgerStore for RocksLedgerStore {
    async fn get_account(&self, handle: &AccountHandle) -> Result<Option<Account>, StorageError> {
        self.load(&account_key(handle), "account")
    }

    async fn save_account(&self, account: &Account) -> Result<(), StorageError> {
        let bytes = Self::encode(account, "account")?;
        self.storage
            .put(&account_key(&account.handle), &bytes)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))
    }

    async fn commit_settlement(&self, account: &Account, record: &BetRecord) -> Result<(), StorageError> {
        let account_bytes = Self::encode(account, "account")?;
        let record_bytes = Self::encode(record, "bet record")?;

        let puts = vec![
            (account_key(&account.handle), account_bytes),
            (bet_record_key(&record.bet_id), record_bytes.clone()),
            (history_key(&record.account, record.sequence), record_bytes),
        ];

        self.storage.write_atomic(puts).map_err(|e| {
            tracing::error!(bet_id = %record.bet_id, account = %account.handle, "Settlement batch rejected: {}", e);
            StorageError::WriteFailed(e.to_string())
        })
    }

    async fn query_recent(&self, handle: &AccountHandle, limit: usize) -> Result<Vec<BetRecord>, StorageError> {
        let rows = self
            .storage
            .scan_prefix(&history_prefix(handle), limit)
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?;

        rows.into_iter()
            .map(|(_, value)| {
                serde_json::from_slice(&value).map_err(|e| {
                    StorageError::CorruptedData(format!("Failed to decode history entry for {}: {}", handle, e))
                })
            })
            .collect()
    }

    async fn get_bet(&self, bet_id: &str) -> Result<Option<BetRecord>, StorageError> {
        self.load(&bet_record_key(bet_id), "bet record")
    }
}
