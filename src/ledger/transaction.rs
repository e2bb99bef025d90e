//! Account Ledger Transaction
//!
//! Every balance mutation runs inside a per-account critical section. The
//! guard returned by [`AccountLedger::lock_account`] must be held from the
//! sufficiency check through the commit, so two settlements for the same
//! account can never interleave. Different accounts never contend.

use crate::{
    errors::{BetError, ValidationError},
    games::{
        classifier::Classification,
        settlement::{apply_delta, Settlement},
        types::{Account, AccountHandle, BetChoice, BetRecord, Dice},
    },
    ledger::store::LedgerStore,
};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type LockRegistry = DashMap<AccountHandle, Arc<Mutex<()>>>;

/// Proof that the caller holds the account's critical section.
///
/// Dropping the guard releases the lock and prunes the registry entry when
/// nobody else is waiting on it.
pub struct AccountGuard {
    handle: AccountHandle,
    guard: Option<OwnedMutexGuard<()>>,
    registry: Arc<LockRegistry>,
}

impl AccountGuard {
    pub fn handle(&self) -> &AccountHandle {
        &self.handle
    }
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.registry
            .remove_if(&self.handle, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Everything about a round except the balance it lands on
#[derive(Debug, Clone, Copy)]
pub struct BetInputs {
    pub choice: BetChoice,
    pub amount: u64,
    pub dice: Dice,
    pub outcome: Classification,
    pub settlement: Settlement,
}

pub struct AccountLedger {
    store: Arc<dyn LedgerStore>,
    locks: Arc<LockRegistry>,
    start_balance: u64,
}

impl AccountLedger {
    pub fn new(store: Arc<dyn LedgerStore>, start_balance: u64) -> Self {
        Self {
            store,
            locks: Arc::new(DashMap::new()),
            start_balance,
        }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Enter the critical section for `handle`
    pub async fn lock_account(&self, handle: &AccountHandle) -> AccountGuard {
        let lock = self
            .locks
            .entry(handle.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;
        AccountGuard {
            handle: handle.clone(),
            guard: Some(guard),
            registry: self.locks.clone(),
        }
    }

    /// Number of accounts with a live lock entry
    pub fn active_locks(&self) -> usize {
        self.locks.len()
    }

    pub async fn get_account(&self, handle: &AccountHandle) -> Result<Account, BetError> {
        self.store
            .get_account(handle)
            .await?
            .ok_or_else(|| BetError::AccountNotFound(handle.to_string()))
    }

    /// Create an account holding the configured starting balance
    pub async fn open_account(&self, handle: &AccountHandle) -> Result<Account, BetError> {
        let _guard = self.lock_account(handle).await;

        if self.store.get_account(handle).await?.is_some() {
            return Err(BetError::AccountExists(handle.to_string()));
        }

        let account = Account::open(handle.clone(), self.start_balance);
        self.store.save_account(&account).await?;
        tracing::info!(account = %handle, balance = account.balance, "Account opened");
        Ok(account)
    }

    /// Apply a resolved round to the account and record it.
    ///
    /// The account is re-read under the guard and the wager re-validated
    /// before the delta is applied. The resulting balance is floored at zero.
    pub async fn apply_settlement(
        &self,
        guard: &AccountGuard,
        delta: i64,
        inputs: BetInputs,
    ) -> Result<(u64, BetRecord), BetError> {
        let mut account = self.get_account(guard.handle()).await?;

        if delta < 0 && account.balance < inputs.amount {
            tracing::warn!(
                account = %account.handle,
                balance = account.balance,
                amount = inputs.amount,
                "Balance changed before commit"
            );
            return Err(BetError::ConcurrencyConflict);
        }

        let new_balance = apply_delta(account.balance, delta).ok_or(ValidationError::BalanceOverflow)?;
        let now = Utc::now();

        let record = BetRecord {
            bet_id: Uuid::new_v4().to_string(),
            account: account.handle.clone(),
            sequence: account.bet_count,
            amount: inputs.amount,
            choice: inputs.choice,
            dice: inputs.dice,
            total: inputs.outcome.total,
            triple: inputs.outcome.triple,
            result: inputs.settlement.result,
            won: inputs.settlement.won,
            balance_after: new_balance,
            created_at: now,
        };

        account.balance = new_balance;
        account.bet_count += 1;
        account.updated_at = now;

        self.store.commit_settlement(&account, &record).await.map_err(|e| {
            tracing::error!(account = %account.handle, bet_id = %record.bet_id, "Settlement commit failed: {}", e);
            BetError::Persistence(e)
        })?;

        Ok((new_balance, record))
    }

    /// Administrative credit. Never creates a bet record and never shares the
    /// settlement path; callers must authorize it separately.
    pub async fn top_up(&self, handle: &AccountHandle, amount: u64) -> Result<Account, BetError> {
        if amount == 0 {
            return Err(ValidationError::InvalidAmount(amount.to_string()).into());
        }

        let _guard = self.lock_account(handle).await;
        let mut account = self.get_account(handle).await?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(ValidationError::BalanceOverflow)?;
        account.updated_at = Utc::now();

        self.store.save_account(&account).await?;
        tracing::info!(account = %handle, amount, balance = account.balance, "Administrative top-up applied");
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{classifier::classify, settlement::SettlementEngine, types::RoundResult};
    use crate::ledger::store::MemoryLedgerStore;

    fn ledger() -> AccountLedger {
        AccountLedger::new(Arc::new(MemoryLedgerStore::new()), 1000)
    }

    fn inputs(choice: BetChoice, amount: u64, dice: Dice) -> BetInputs {
        let outcome = classify(dice);
        let settlement = SettlementEngine::new().resolve(choice, amount, &outcome);
        BetInputs { choice, amount, dice, outcome, settlement }
    }

    #[tokio::test]
    async fn test_open_account_once() {
        let ledger = ledger();
        let alice = AccountHandle::parse("alice").unwrap();

        let account = ledger.open_account(&alice).await.unwrap();
        assert_eq!(account.balance, 1000);
        assert!(matches!(ledger.open_account(&alice).await, Err(BetError::AccountExists(_))));
    }

    #[tokio::test]
    async fn test_apply_settlement_records_round() {
        let ledger = ledger();
        let alice = AccountHandle::parse("alice").unwrap();
        ledger.open_account(&alice).await.unwrap();

        let bet = inputs(BetChoice::Tai, 100, Dice::new(3, 3, 3).unwrap());
        let guard = ledger.lock_account(&alice).await;
        let (balance, record) = ledger.apply_settlement(&guard, bet.settlement.delta, bet).await.unwrap();
        drop(guard);

        assert_eq!(balance, 900);
        assert_eq!(record.result, RoundResult::Triple);
        assert!(!record.won);
        assert_eq!(record.sequence, 0);
        assert_eq!(ledger.get_account(&alice).await.unwrap().bet_count, 1);
    }

    #[tokio::test]
    async fn test_commit_time_revalidation() {
        let ledger = ledger();
        let alice = AccountHandle::parse("alice").unwrap();
        ledger.open_account(&alice).await.unwrap();

        // Wager larger than the stored balance reaches the commit step
        let bet = inputs(BetChoice::Xiu, 5000, Dice::new(6, 6, 5).unwrap());
        let guard = ledger.lock_account(&alice).await;
        let err = ledger.apply_settlement(&guard, bet.settlement.delta, bet).await.unwrap_err();

        assert!(matches!(err, BetError::ConcurrencyConflict));
        assert_eq!(ledger.get_account(&alice).await.unwrap().balance, 1000);
    }

    #[tokio::test]
    async fn test_clamp_at_zero() {
        let ledger = ledger();
        let alice = AccountHandle::parse("alice").unwrap();
        ledger.open_account(&alice).await.unwrap();

        // Bypass re-validation by passing a delta larger than the recorded amount
        let bet = inputs(BetChoice::Tai, 1000, Dice::new(1, 1, 2).unwrap());
        let guard = ledger.lock_account(&alice).await;
        let (balance, _) = ledger.apply_settlement(&guard, -1500, bet).await.unwrap();
        assert_eq!(balance, 0);
    }

    #[tokio::test]
    async fn test_lock_is_exclusive_per_account() {
        use std::time::Duration;
        use tokio::time::timeout;

        let ledger = ledger();
        let alice = AccountHandle::parse("alice").unwrap();
        let bob = AccountHandle::parse("bob").unwrap();

        let guard = ledger.lock_account(&alice).await;
        assert!(timeout(Duration::from_millis(50), ledger.lock_account(&alice)).await.is_err());
        // Other accounts are not blocked
        assert!(timeout(Duration::from_millis(50), ledger.lock_account(&bob)).await.is_ok());

        drop(guard);
        assert!(timeout(Duration::from_millis(50), ledger.lock_account(&alice)).await.is_ok());
    }

    #[tokio::test]
    async fn test_lock_registry_is_pruned() {
        let ledger = ledger();
        let alice = AccountHandle::parse("alice").unwrap();

        {
            let _guard = ledger.lock_account(&alice).await;
            assert_eq!(ledger.active_locks(), 1);
        }
        assert_eq!(ledger.active_locks(), 0);
    }

    #[tokio::test]
    async fn test_top_up() {
        let ledger = ledger();
        let alice = AccountHandle::parse("alice").unwrap();
        ledger.open_account(&alice).await.unwrap();

        let account = ledger.top_up(&alice, 500).await.unwrap();
        assert_eq!(account.balance, 1500);
        assert!(ledger.top_up(&alice, 0).await.is_err());
        assert!(matches!(
            ledger.top_up(&AccountHandle::parse("ghost").unwrap(), 10).await,
            Err(BetError::AccountNotFound(_))
        ));
        assert!(ledger.store().query_recent(&alice, 10).await.unwrap().is_empty());
    }
}
