//! Error types for the Tài/Xỉu settlement service
//!
//! Every failure of a bet placement is local to that attempt. Nothing here is
//! retried automatically; retry policy belongs to the caller.

use thiserror::Error;

/// Root error type for all service operations
#[derive(Debug, Error)]
pub enum TaixiuError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Storage system errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Bet placement and settlement errors
    #[error("Bet error: {0}")]
    Bet(#[from] BetError),
}

/// Configuration and validation errors
#[derive(Debug, Clone, Error)]
pub enum ConfigurationError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),
}

/// Storage system errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Database open failed: {0}")]
    DatabaseOpenFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Corrupted data: {0}")]
    CorruptedData(String),
}

/// Request validation failures. No draw is taken and nothing is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid choice: {0:?} (expected \"tai\" or \"xiu\")")]
    InvalidChoice(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("amount {0} exceeds the largest accepted wager")]
    AmountTooLarge(u64),

    #[error("invalid account handle: {0:?}")]
    InvalidHandle(String),

    #[error("balance overflow")]
    BalanceOverflow,

    #[error("malformed request: {0}")]
    Malformed(String),
}

/// Bet placement errors
#[derive(Debug, Error)]
pub enum BetError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("insufficient balance: balance {balance}, wager {amount}")]
    InsufficientFunds { balance: u64, amount: u64 },

    /// Commit-time re-validation failed. Reported to callers as insufficient funds.
    #[error("balance changed before commit")]
    ConcurrencyConflict,

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("account already exists: {0}")]
    AccountExists(String),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StorageError),
}

impl BetError {
    /// Machine-readable error kind exposed to callers.
    ///
    /// A commit-time conflict has the same external shape as an ordinary
    /// insufficient balance rejection.
    pub fn kind(&self) -> &'static str {
        match self {
            BetError::Validation(_) => "VALIDATION_ERROR",
            BetError::InsufficientFunds { .. } | BetError::ConcurrencyConflict => "INSUFFICIENT_FUNDS",
            BetError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            BetError::AccountExists(_) => "ACCOUNT_EXISTS",
            BetError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// True when the caller should see an insufficient balance rejection
    pub fn is_insufficient_funds(&self) -> bool {
        self.kind() == "INSUFFICIENT_FUNDS"
    }
}

// External error conversions
impl From<toml::de::Error> for TaixiuError {
    fn from(e: toml::de::Error) -> Self {
        TaixiuError::Configuration(ConfigurationError::LoadFailed(e.to_string()))
    }
}

// Convenience type alias for Results
pub type TaixiuResult<T> = Result<T, TaixiuError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let config_error = ConfigurationError::ValidationFailed("test".to_string());
        let root = TaixiuError::Configuration(config_error);

        assert!(root.to_string().contains("Configuration error"));
        assert!(root.to_string().contains("test"));
    }

    #[test]
    fn test_conflict_reported_as_insufficient_funds() {
        let conflict = BetError::ConcurrencyConflict;
        let plain = BetError::InsufficientFunds { balance: 50, amount: 100 };

        assert_eq!(conflict.kind(), plain.kind());
        assert!(conflict.is_insufficient_funds());
    }

    #[test]
    fn test_error_kinds() {
        let validation: BetError = ValidationError::InvalidChoice("big".into()).into();
        assert_eq!(validation.kind(), "VALIDATION_ERROR");

        let storage: BetError = StorageError::WriteFailed("disk".into()).into();
        assert_eq!(storage.kind(), "PERSISTENCE_ERROR");
        assert!(!storage.is_insufficient_funds());
    }

    #[test]
    fn test_error_source() {
        let root: TaixiuError = StorageError::ReadFailed("io".into()).into();
        assert!(root.source().is_some());
    }
}
