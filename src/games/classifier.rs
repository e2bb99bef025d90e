//! Outcome classification
//!
//! House rules: any triple is TRIPLE regardless of total, otherwise totals
//! 4..=10 are XIU and 11..=17 are TAI. Changing the partition changes the
//! house edge.

use crate::games::types::{Dice, RoundResult};
use serde::{Deserialize, Serialize};

/// Classified roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub total: u8,
    pub triple: bool,
    pub result: RoundResult,
}

pub fn classify(dice: Dice) -> Classification {
    let [d1, d2, d3] = dice.faces();
    let total = d1 + d2 + d3;
    let triple = d1 == d2 && d2 == d3;

    let result = if triple {
        RoundResult::Triple
    } else {
        match total {
            4..=10 => RoundResult::Xiu,
            11..=17 => RoundResult::Tai,
            // 3 and 18 only come from (1,1,1) and (6,6,6)
            _ => RoundResult::Unknown,
        }
    };

    Classification { total, triple, result }
}
