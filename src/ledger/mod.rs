pub mod history;
pub mod rocks_store;
pub mod store;
pub mod transaction;

pub use history::BetHistory;
pub use rocks_store::RocksLedgerStore;
pub use store::{LedgerStore, MemoryLedgerStore};
pub use transaction::{AccountGuard, AccountLedger, BetInputs};
