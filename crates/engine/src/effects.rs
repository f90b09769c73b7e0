//! Balance effect algebra.
//!
//! Every transaction maps to one or two signed per-account deltas. The
//! mutation path applies effects as written; reversing a transaction is
//! applying the negated effect, which is what both update (reverse old,
//! apply new) and the backward history replay are built on.

use uuid::Uuid;

use crate::transactions::{Transaction, TransactionKind};

/// A signed balance change on one account, in minor units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountDelta {
    pub account_id: Uuid,
    pub delta: i64,
}

/// The full effect of one transaction: one delta for income/expense, two for
/// a transfer. Fee rows are plain expenses and carry their own effect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BalanceEffect {
    deltas: Vec<AccountDelta>,
}

impl BalanceEffect {
    /// Computes the effect of a persisted transaction. Endpoint fields are
    /// guaranteed by the mutation path, so an income/expense always has its
    /// account and a transfer both endpoints.
    #[must_use]
    pub fn of(tx: &Transaction) -> Self {
        let mut deltas = Vec::with_capacity(2);
        match tx.kind {
            TransactionKind::Income => {
                if let Some(account_id) = tx.account_id {
                    deltas.push(AccountDelta {
                        account_id,
                        delta: tx.amount,
                    });
                }
            }
            TransactionKind::Expense => {
                if let Some(account_id) = tx.account_id {
                    deltas.push(AccountDelta {
                        account_id,
                        delta: -tx.amount,
                    });
                }
            }
            TransactionKind::Transfer => {
                if let Some(from) = tx.from_account_id {
                    deltas.push(AccountDelta {
                        account_id: from,
                        delta: -tx.amount,
                    });
                }
                if let Some(to) = tx.to_account_id {
                    deltas.push(AccountDelta {
                        account_id: to,
                        delta: tx.amount,
                    });
                }
            }
        }
        Self { deltas }
    }

    /// The inverse effect: applying it after the original is a no-op.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            deltas: self
                .deltas
                .iter()
                .map(|d| AccountDelta {
                    account_id: d.account_id,
                    delta: -d.delta,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn deltas(&self) -> &[AccountDelta] {
        &self.deltas
    }

    /// The signed delta this effect applies to one specific account, summing
    /// both legs when a transfer touches the same account twice.
    #[must_use]
    pub fn delta_for(&self, account_id: Uuid) -> i64 {
        self.deltas
            .iter()
            .filter(|d| d.account_id == account_id)
            .map(|d| d.delta)
            .sum()
    }
}
