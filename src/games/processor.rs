use crate::{
    errors::BetError,
    games::{
        classifier::classify,
        draw::DrawSource,
        settlement::SettlementEngine,
        types::{AccountHandle, BetReceipt, BetTicket},
    },
    ledger::{AccountLedger, BetInputs},
    metrics::BetMetrics,
};
use std::sync::Arc;

/// Places bets: precondition check, draw, classification, settlement and
/// commit, all inside the account's critical section
pub struct BetProcessor {
    ledger: Arc<AccountLedger>,
    draw: Arc<dyn DrawSource>,
    engine: SettlementEngine,
    metrics: Arc<BetMetrics>,
}

impl BetProcessor {
    pub fn new(ledger: Arc<AccountLedger>, draw: Arc<dyn DrawSource>, metrics: Arc<BetMetrics>) -> Self {
        Self {
            ledger,
            draw,
            engine: SettlementEngine::new(),
            metrics,
        }
    }

    pub fn ledger(&self) -> &Arc<AccountLedger> {
        &self.ledger
    }

    /// Settle one round for an authenticated account
    pub async fn place_bet(&self, handle: &AccountHandle, ticket: BetTicket) -> Result<BetReceipt, BetError> {
        let result = self.settle_round(handle, ticket).await;
        match &result {
            Ok(receipt) => tracing::info!(
                account = %handle,
                bet_id = %receipt.bet_id,
                choice = %ticket.choice,
                amount = ticket.amount,
                result = %receipt.result,
                won = receipt.won,
                balance = receipt.balance,
                "Bet settled"
            ),
            Err(e) => {
                self.metrics.record_rejection(e);
                match e {
                    BetError::Persistence(_) => {
                        tracing::error!(account = %handle, amount = ticket.amount, "Bet aborted: {}", e)
                    }
                    _ => tracing::warn!(account = %handle, amount = ticket.amount, kind = e.kind(), "Bet rejected: {}", e),
                }
            }
        }
        result
    }

    async fn settle_round(&self, handle: &AccountHandle, ticket: BetTicket) -> Result<BetReceipt, BetError> {
        let guard = self.ledger.lock_account(handle).await;

        // Rejections here happen before any entropy is spent
        let account = self.ledger.get_account(handle).await?;
        self.engine.check_preconditions(ticket.amount, account.balance)?;

        let dice = self.draw.draw();
        let outcome = classify(dice);
        let settlement = self.engine.resolve(ticket.choice, ticket.amount, &outcome);

        let inputs = BetInputs {
            choice: ticket.choice,
            amount: ticket.amount,
            dice,
            outcome,
            settlement,
        };
        let (_, record) = self.ledger.apply_settlement(&guard, settlement.delta, inputs).await?;
        drop(guard);

        self.metrics.record_settlement(&record);
        Ok(BetReceipt::from(&record))
    }
}
