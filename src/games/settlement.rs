//! Settlement Engine
//!
//! Pure win/loss resolution for a single round. Payout is flat 1:1, and the
//! house takes every side bet when the dice come up triple.

use crate::errors::{BetError, ValidationError};
use crate::games::classifier::Classification;
use crate::games::types::{BetChoice, RoundResult};
use serde::{Deserialize, Serialize};

/// Outcome of resolving one wager against a classified roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub result: RoundResult,
    pub won: bool,
    /// Signed balance change: `+amount` on a win, `-amount` on a loss
    pub delta: i64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SettlementEngine;

impl SettlementEngine {
    pub fn new() -> Self {
        Self
    }

    /// Checks that must pass before any entropy is spent on a draw
    pub fn check_preconditions(&self, amount: u64, balance: u64) -> Result<(), BetError> {
        if amount == 0 {
            return Err(ValidationError::InvalidAmount(amount.to_string()).into());
        }
        if amount > i64::MAX as u64 {
            return Err(ValidationError::AmountTooLarge(amount).into());
        }
        if balance < amount {
            return Err(BetError::InsufficientFunds { balance, amount });
        }
        Ok(())
    }

    /// Resolve a wager. `amount` must already have passed `check_preconditions`.
    pub fn resolve(&self, choice: BetChoice, amount: u64, outcome: &Classification) -> Settlement {
        let won = match outcome.result {
            RoundResult::Triple => false,
            result => result.winning_side() == Some(choice),
        };

        let stake = amount as i64;
        Settlement {
            result: outcome.result,
            won,
            delta: if won { stake } else { -stake },
        }
    }
}

/// Balance after applying `delta`, floored at zero.
///
/// A loss larger than the balance takes the balance to zero rather than
/// failing. Returns `None` only when a win would overflow.
pub fn apply_delta(balance: u64, delta: i64) -> Option<u64> {
    if delta >= 0 {
        balance.checked_add(delta as u64)
    } else {
        Some(balance.saturating_sub(delta.unsigned_abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::classifier::classify;
    use crate::games::types::Dice;

    fn roll(d1: u8, d2: u8, d3: u8) -> Classification {
        classify(Dice::new(d1, d2, d3).unwrap())
    }

    #[test]
    fn test_triple_never_wins() {
        let engine = SettlementEngine::new();
        for face in 1..=6 {
            for choice in [BetChoice::Tai, BetChoice::Xiu] {
                let s = engine.resolve(choice, 100, &roll(face, face, face));
                assert_eq!(s.result, RoundResult::Triple);
                assert!(!s.won);
                assert_eq!(s.delta, -100);
            }
        }
    }

    #[test]
    fn test_side_matches_result() {
        let engine = SettlementEngine::new();

        let tai = roll(4, 5, 6);
        assert!(engine.resolve(BetChoice::Tai, 200, &tai).won);
        assert_eq!(engine.resolve(BetChoice::Tai, 200, &tai).delta, 200);
        assert!(!engine.resolve(BetChoice::Xiu, 200, &tai).won);

        let xiu = roll(1, 2, 1);
        assert!(engine.resolve(BetChoice::Xiu, 50, &xiu).won);
        assert_eq!(engine.resolve(BetChoice::Tai, 50, &xiu).delta, -50);
    }

    #[test]
    fn test_every_roll_is_resolved_consistently() {
        let engine = SettlementEngine::new();
        for dice in Dice::all() {
            let outcome = classify(dice);
            for choice in [BetChoice::Tai, BetChoice::Xiu] {
                let s = engine.resolve(choice, 10, &outcome);
                let expected = !outcome.triple && outcome.result.winning_side() == Some(choice);
                assert_eq!(s.won, expected, "{:?} {:?}", dice, choice);
                assert_eq!(s.delta.abs(), 10);
            }
        }
    }

    #[test]
    fn test_preconditions() {
        let engine = SettlementEngine::new();
        assert!(engine.check_preconditions(100, 1000).is_ok());
        assert!(engine.check_preconditions(50, 50).is_ok());

        assert!(matches!(
            engine.check_preconditions(100, 50),
            Err(BetError::InsufficientFunds { balance: 50, amount: 100 })
        ));
        assert!(matches!(engine.check_preconditions(0, 50), Err(BetError::Validation(_))));
        assert!(matches!(
            engine.check_preconditions(u64::MAX, u64::MAX),
            Err(BetError::Validation(ValidationError::AmountTooLarge(_)))
        ));
    }

    #[test]
    fn test_apply_delta_clamps_at_zero() {
        assert_eq!(apply_delta(1000, -100), Some(900));
        assert_eq!(apply_delta(30, -100), Some(0));
        assert_eq!(apply_delta(50, 50), Some(100));
        assert_eq!(apply_delta(u64::MAX, 1), None);
    }
}
