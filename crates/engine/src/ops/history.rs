//! Daily balance series reconstructed by backward replay.
//!
//! The ledger stores no snapshots. To answer "what was the balance on day
//! D", the engine starts from the live cached balance and un-applies
//! transactions newest first: everything dated after the window gets
//! reversed in one pass, then the window is walked day by day from the end,
//! recording the end-of-day balance before reversing that day's rows.

use chrono::NaiveDate;
use sea_orm::{Condition, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Account, BalanceEffect, EngineError, ResultEngine, Transaction, TransactionKind, accounts,
    transactions,
};

use super::{Engine, with_tx};

/// One day of the series. `balance` is the end-of-day balance; `income` and
/// `expense` are that day's flow totals, always non-negative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub balance: i64,
    pub income: i64,
    pub expense: i64,
}

/// Daily series for a window, oldest day first. Scoped to one account when
/// `account_id` is set, otherwise aggregated over every account of the
/// owner. The totals are the sums of the daily flow buckets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceHistory {
    pub account_id: Option<Uuid>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<DayBucket>,
    pub total_income: i64,
    pub total_expense: i64,
}

/// Signed balance movement of one transaction within the requested scope.
///
/// Scoped to an account, a transfer contributes only the leg touching that
/// account; globally, its legs cancel out and the movement is zero.
fn scoped_delta(tx: &Transaction, scope: Option<Uuid>) -> i64 {
    let effect = BalanceEffect::of(tx);
    match scope {
        Some(account_id) => effect.delta_for(account_id),
        None => effect.deltas().iter().map(|d| d.delta).sum(),
    }
}

/// Flow contribution of one transaction: `(income, expense)`. Transfers
/// move balance but are never income or spending, in either scope.
fn scoped_flows(tx: &Transaction, scope: Option<Uuid>) -> (i64, i64) {
    if scope.is_some() && tx.account_id != scope {
        return (0, 0);
    }
    match tx.kind {
        TransactionKind::Income => (tx.amount, 0),
        TransactionKind::Expense => (0, tx.amount),
        TransactionKind::Transfer => (0, 0),
    }
}

impl Engine {
    /// Builds the daily balance/income/expense series for `[start, end]`.
    ///
    /// Fee rows replay like any other expense. The reconstruction touches no
    /// stored balance: it only reads, inside one database transaction, so
    /// the series is consistent with a single point in time.
    pub async fn balance_history(
        &self,
        owner_id: &str,
        account_id: Option<Uuid>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ResultEngine<BalanceHistory> {
        if start > end {
            return Err(EngineError::InvalidTransaction(
                "invalid range: start must be <= end".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let live_balance = match account_id {
                Some(account_id) => {
                    let model = self.require_account(&db_tx, owner_id, account_id).await?;
                    model.total_balance
                }
                None => {
                    let models = accounts::Entity::find()
                        .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
                        .all(&db_tx)
                        .await?;
                    models
                        .into_iter()
                        .map(Account::try_from)
                        .try_fold(0i64, |acc, account| Ok::<_, EngineError>(acc + account?.total_balance))?
                }
            };

            // Newest first: rows after the window are consumed before the
            // walk, the rest day by day.
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::OwnerId.eq(owner_id.to_string()))
                .filter(transactions::Column::Date.gte(start));
            if let Some(account_id) = account_id {
                let id = account_id.to_string();
                query = query.filter(
                    Condition::any()
                        .add(transactions::Column::AccountId.eq(id.clone()))
                        .add(transactions::Column::FromAccountId.eq(id.clone()))
                        .add(transactions::Column::ToAccountId.eq(id)),
                );
            }
            let models = query
                .order_by_desc(transactions::Column::Date)
                .order_by_desc(transactions::Column::Id)
                .all(&db_tx)
                .await?;

            let mut rows = Vec::with_capacity(models.len());
            for model in models {
                rows.push(Transaction::try_from(model)?);
            }

            let mut running = live_balance;
            let mut next = 0;
            while next < rows.len() && rows[next].date > end {
                running -= scoped_delta(&rows[next], account_id);
                next += 1;
            }

            let mut days = Vec::new();
            let mut day = end;
            loop {
                let mut bucket = DayBucket {
                    date: day,
                    balance: running,
                    income: 0,
                    expense: 0,
                };
                while next < rows.len() && rows[next].date == day {
                    let tx = &rows[next];
                    running -= scoped_delta(tx, account_id);
                    let (income, expense) = scoped_flows(tx, account_id);
                    bucket.income += income;
                    bucket.expense += expense;
                    next += 1;
                }
                days.push(bucket);
                if day == start {
                    break;
                }
                day = day.pred_opt().ok_or_else(|| {
                    EngineError::InvalidTransaction("date out of range".to_string())
                })?;
            }
            days.reverse();

            let total_income = days.iter().map(|d| d.income).sum();
            let total_expense = days.iter().map(|d| d.expense).sum();
            Ok(BalanceHistory {
                account_id,
                start,
                end,
                days,
                total_income,
                total_expense,
            })
        })
    }
}
