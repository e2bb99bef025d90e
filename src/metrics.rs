//! Settlement metrics with Prometheus text export

use crate::errors::BetError;
use crate::games::types::{BetRecord, RoundResult};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct BetMetrics {
    bets_total: AtomicU64,
    bets_won: AtomicU64,
    bets_lost: AtomicU64,
    triples_total: AtomicU64,
    wagered_total: AtomicU64,
    paid_out_total: AtomicU64,
    rejected_validation: AtomicU64,
    rejected_insufficient: AtomicU64,
    rejected_other: AtomicU64,
    persistence_failures: AtomicU64,
}

impl BetMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_settlement(&self, record: &BetRecord) {
        self.bets_total.fetch_add(1, Ordering::Relaxed);
        self.wagered_total.fetch_add(record.amount, Ordering::Relaxed);
        if record.won {
            self.bets_won.fetch_add(1, Ordering::Relaxed);
            self.paid_out_total.fetch_add(record.amount, Ordering::Relaxed);
        } else {
            self.bets_lost.fetch_add(1, Ordering::Relaxed);
        }
        if record.result == RoundResult::Triple {
            self.triples_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rejection(&self, error: &BetError) {
        let counter = match error {
            BetError::Validation(_) => &self.rejected_validation,
            BetError::InsufficientFunds { .. } | BetError::ConcurrencyConflict => &self.rejected_insufficient,
            BetError::Persistence(_) => &self.persistence_failures,
            BetError::AccountNotFound(_) | BetError::AccountExists(_) => &self.rejected_other,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bets_total(&self) -> u64 {
        self.bets_total.load(Ordering::Relaxed)
    }

    pub fn rejected_insufficient(&self) -> u64 {
        self.rejected_insufficient.load(Ordering::Relaxed)
    }

    /// Generate Prometheus metrics format
    pub fn to_prometheus_format(&self) -> String {
        let mut output = String::new();

        let counters = [
            ("taixiu_bets_total", "Settled bets", &self.bets_total),
            ("taixiu_bets_won_total", "Settled bets won by the player", &self.bets_won),
            ("taixiu_bets_lost_total", "Settled bets lost by the player", &self.bets_lost),
            ("taixiu_triples_total", "Rounds that rolled a triple", &self.triples_total),
            ("taixiu_wagered_total", "Sum of settled wagers", &self.wagered_total),
            ("taixiu_paid_out_total", "Sum of winnings credited", &self.paid_out_total),
            ("taixiu_persistence_failures_total", "Settlements aborted by a storage failure", &self.persistence_failures),
        ];
        for (name, help, value) in counters {
            output.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n\n",
                value.load(Ordering::Relaxed)
            ));
        }

        output.push_str(
            "# HELP taixiu_bets_rejected_total Bets rejected before settlement\n\
             # TYPE taixiu_bets_rejected_total counter\n",
        );
        for (kind, value) in [
            ("validation", &self.rejected_validation),
            ("insufficient_funds", &self.rejected_insufficient),
            ("other", &self.rejected_other),
        ] {
            output.push_str(&format!(
                "taixiu_bets_rejected_total{{kind=\"{}\"}} {}\n",
                kind,
                value.load(Ordering::Relaxed)
            ));
        }

        output
    }
}
