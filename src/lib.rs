//! Tài/Xỉu - Three-Dice Bet Settlement Service
//!
//! Accepts a wager on the sum of three dice ("tai" for 11-17, "xiu" for 4-10),
//! draws the dice from the OS random source, settles even money against the
//! account balance, and records every settled round. Triples lose for every
//! bettor.
//!
//! Each account's read-validate-settle-commit sequence runs under a per-account
//! lock, and the balance update and bet record are committed together.

pub mod api;
pub mod config;
pub mod errors;
pub mod games;
pub mod ledger;
pub mod metrics;
pub mod storage;

pub use config::{ConfigLoader, TaixiuConfig};
pub use errors::{BetError, TaixiuError, TaixiuResult};
pub use games::{BetProcessor, DrawSource, ScriptedDraw, SecureDraw};
pub use ledger::{AccountLedger, BetHistory, LedgerStore, MemoryLedgerStore, RocksLedgerStore};
