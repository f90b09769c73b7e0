use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    BalanceEffect, Category, CreateTransactionCmd, Currency, EngineError, FeePatch, FeeSpec,
    ResultEngine, Transaction, TransactionKind, UpdateTransactionCmd, transactions,
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

/// Filters for listing transactions.
///
/// `from` and `to` are both inclusive calendar dates in the ledger's local
/// convention. `account_id` matches any endpoint of the row.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub account_id: Option<Uuid>,
    /// If present, acts as an allow-list of kinds to return.
    pub kinds: Option<Vec<TransactionKind>>,
    /// If true, fee rows show up as standalone entries (default: false).
    pub include_fees: bool,
    /// Caps the number of rows returned, newest first.
    pub limit: Option<u64>,
}

/// A transaction together with its fee child, when one exists. `category` is
/// the main row's category, denormalized for display; it never feeds back
/// into balance bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRecord {
    pub transaction: Transaction,
    pub fee: Option<Transaction>,
    pub category: Option<Category>,
}

/// Outcome of a delete. The engine only removes database rows; attachment
/// files referenced by the deleted rows are reported back so the caller can
/// clean them up after the commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletedTransaction {
    pub id: Uuid,
    pub attachment_paths: Vec<String>,
}

fn validate_amount(amount: i64) -> ResultEngine<()> {
    if amount <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount must be > 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_shape(
    kind: TransactionKind,
    account_id: Option<Uuid>,
    from_account_id: Option<Uuid>,
    to_account_id: Option<Uuid>,
    category_id: Option<Uuid>,
) -> ResultEngine<()> {
    match kind {
        TransactionKind::Income | TransactionKind::Expense => {
            if account_id.is_none() {
                return Err(EngineError::InvalidTransaction(
                    "account_id is required".to_string(),
                ));
            }
            if category_id.is_none() {
                return Err(EngineError::InvalidTransaction(
                    "category_id is required".to_string(),
                ));
            }
            if from_account_id.is_some() || to_account_id.is_some() {
                return Err(EngineError::InvalidTransaction(
                    "unexpected transfer endpoints".to_string(),
                ));
            }
        }
        TransactionKind::Transfer => {
            let (Some(from), Some(to)) = (from_account_id, to_account_id) else {
                return Err(EngineError::InvalidTransaction(
                    "from_account_id and to_account_id are required".to_string(),
                ));
            };
            if from == to {
                return Err(EngineError::InvalidTransaction(
                    "from_account_id and to_account_id must differ".to_string(),
                ));
            }
            if account_id.is_some() {
                return Err(EngineError::InvalidTransaction(
                    "unexpected account_id on a transfer".to_string(),
                ));
            }
            if category_id.is_some() {
                return Err(EngineError::InvalidTransaction(
                    "unexpected category_id on a transfer".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// The account that pays fees for a transaction: the debited side.
fn paying_account(tx: &Transaction) -> Option<Uuid> {
    match tx.kind {
        TransactionKind::Income => None,
        TransactionKind::Expense => tx.account_id,
        TransactionKind::Transfer => tx.from_account_id,
    }
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(EngineError::InvalidTransaction(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    if filter.kinds.as_ref().is_some_and(|k| k.is_empty()) {
        return Err(EngineError::InvalidTransaction(
            "kinds must not be empty".to_string(),
        ));
    }
    Ok(())
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::Date.lte(to));
        }
        if let Some(account_id) = filter.account_id {
            let id = account_id.to_string();
            self = self.filter(
                Condition::any()
                    .add(transactions::Column::AccountId.eq(id.clone()))
                    .add(transactions::Column::FromAccountId.eq(id.clone()))
                    .add(transactions::Column::ToAccountId.eq(id)),
            );
        }
        if let Some(kinds) = &filter.kinds {
            let kinds: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();
            self = self.filter(transactions::Column::Kind.is_in(kinds));
        }
        if !filter.include_fees {
            self = self.filter(transactions::Column::ParentTransactionId.is_null());
        }
        self
    }
}

impl Engine {
    /// Checks that every referenced account exists for this owner, and that a
    /// transfer moves money between accounts of the same currency.
    async fn resolve_endpoints(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
        tx: &Transaction,
    ) -> ResultEngine<()> {
        if let Some(account_id) = tx.account_id {
            self.require_account(db_tx, owner_id, account_id).await?;
        }
        if let (Some(from), Some(to)) = (tx.from_account_id, tx.to_account_id) {
            let from_model = self.require_account(db_tx, owner_id, from).await?;
            let to_model = self.require_account(db_tx, owner_id, to).await?;
            let from_currency = Currency::try_from(from_model.currency.as_str())?;
            let to_currency = Currency::try_from(to_model.currency.as_str())?;
            if from_currency != to_currency {
                return Err(EngineError::CurrencyMismatch(format!(
                    "cannot transfer {} to {}",
                    from_currency.code(),
                    to_currency.code()
                )));
            }
        }
        Ok(())
    }

    /// Loads the main row's category for display. Also serves as the
    /// existence check, so callers run it before writing anything.
    async fn load_category(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
        category_id: Option<Uuid>,
    ) -> ResultEngine<Option<Category>> {
        match category_id {
            Some(category_id) => {
                let model = self.require_category(db_tx, owner_id, category_id).await?;
                Ok(Some(Category::try_from(model)?))
            }
            None => Ok(None),
        }
    }

    /// Simulates an effect against the in-memory balance map, loading each
    /// account at most once inside the transaction.
    async fn apply_effect(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
        new_balances: &mut HashMap<Uuid, i64>,
        effect: &BalanceEffect,
    ) -> ResultEngine<()> {
        for delta in effect.deltas() {
            self.apply_account_delta(db_tx, owner_id, new_balances, delta.account_id, delta.delta)
                .await?;
        }
        Ok(())
    }

    /// Builds the fee child row for a parent transaction.
    fn build_fee(
        &self,
        parent: &Transaction,
        spec: &FeeSpec,
    ) -> ResultEngine<Transaction> {
        if parent.kind == TransactionKind::Income {
            return Err(EngineError::InvalidTransaction(
                "an income cannot carry a fee".to_string(),
            ));
        }
        validate_amount(spec.amount)?;
        let account_id = spec
            .account_id
            .or_else(|| paying_account(parent))
            .ok_or_else(|| {
                EngineError::InvalidTransaction("fee has no account to charge".to_string())
            })?;
        let now = Utc::now();
        Ok(Transaction {
            id: Uuid::new_v4(),
            owner_id: parent.owner_id.clone(),
            kind: TransactionKind::Expense,
            amount: spec.amount,
            account_id: Some(account_id),
            from_account_id: None,
            to_account_id: None,
            category_id: spec.category_id,
            date: parent.date,
            time: parent.time,
            note: normalize_optional_text(spec.note.clone()),
            parent_transaction_id: Some(parent.id),
            attachment: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn require_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::OwnerId.eq(owner_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
        Transaction::try_from(model)
    }

    async fn find_fee_child(
        &self,
        db_tx: &DatabaseTransaction,
        parent_id: Uuid,
    ) -> ResultEngine<Option<Transaction>> {
        let model = transactions::Entity::find()
            .filter(transactions::Column::ParentTransactionId.eq(parent_id.to_string()))
            .one(db_tx)
            .await?;
        model.map(Transaction::try_from).transpose()
    }

    /// Creates a transaction, its optional fee child, and the balance
    /// updates they imply, atomically. On any failure nothing is written.
    pub async fn create_transaction(
        &self,
        owner_id: &str,
        cmd: CreateTransactionCmd,
    ) -> ResultEngine<TransactionRecord> {
        validate_amount(cmd.amount)?;
        validate_shape(
            cmd.kind,
            cmd.account_id,
            cmd.from_account_id,
            cmd.to_account_id,
            cmd.category_id,
        )?;

        let now = Utc::now();
        let tx = Transaction {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            kind: cmd.kind,
            amount: cmd.amount,
            account_id: cmd.account_id,
            from_account_id: cmd.from_account_id,
            to_account_id: cmd.to_account_id,
            category_id: cmd.category_id,
            date: cmd.date,
            time: cmd.time,
            note: normalize_optional_text(cmd.note),
            parent_transaction_id: None,
            attachment: cmd.attachment,
            created_at: now,
            updated_at: now,
        };
        let fee = cmd
            .fee
            .as_ref()
            .map(|spec| self.build_fee(&tx, spec))
            .transpose()?;

        with_tx!(self, |db_tx| {
            self.resolve_endpoints(&db_tx, owner_id, &tx).await?;
            let category = self.load_category(&db_tx, owner_id, tx.category_id).await?;

            let mut new_balances: HashMap<Uuid, i64> = HashMap::new();
            self.apply_effect(&db_tx, owner_id, &mut new_balances, &BalanceEffect::of(&tx))
                .await?;
            if let Some(fee) = &fee {
                if let Some(category_id) = fee.category_id {
                    self.require_category(&db_tx, owner_id, category_id).await?;
                }
                self.apply_effect(&db_tx, owner_id, &mut new_balances, &BalanceEffect::of(fee))
                    .await?;
            }

            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            if let Some(fee) = &fee {
                transactions::ActiveModel::from(fee).insert(&db_tx).await?;
            }

            self.persist_balances(&db_tx, new_balances).await?;
            Ok(TransactionRecord {
                transaction: tx,
                fee,
                category,
            })
        })
    }

    /// Rewrites a transaction by reversing its old effect and applying the
    /// new one, so a kind change (expense to transfer, say) needs no special
    /// casing. Fee rows are edited through their parent only.
    pub async fn update_transaction(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
        cmd: UpdateTransactionCmd,
    ) -> ResultEngine<TransactionRecord> {
        with_tx!(self, |db_tx| {
            let old = self
                .require_transaction(&db_tx, owner_id, transaction_id)
                .await?;
            if old.is_fee() {
                return Err(EngineError::InvalidTransaction(
                    "fee rows are edited through their parent".to_string(),
                ));
            }

            let new_kind = cmd.kind.unwrap_or(old.kind);
            let kind_changed = new_kind != old.kind;

            // Endpoints carried over from the old row only make sense while
            // the kind's shape is unchanged.
            let (account_id, from_account_id, to_account_id) = match new_kind {
                TransactionKind::Income | TransactionKind::Expense => {
                    let inherited = if kind_changed && old.kind == TransactionKind::Transfer {
                        None
                    } else {
                        old.account_id
                    };
                    (cmd.account_id.or(inherited), None, None)
                }
                TransactionKind::Transfer => {
                    let (inherited_from, inherited_to) = if kind_changed {
                        (None, None)
                    } else {
                        (old.from_account_id, old.to_account_id)
                    };
                    (
                        None,
                        cmd.from_account_id.or(inherited_from),
                        cmd.to_account_id.or(inherited_to),
                    )
                }
            };

            // A transfer never carries a category, so one inherited from the
            // old row is dropped on a kind change instead of rejected.
            let category_id = match (new_kind, cmd.category_id) {
                (TransactionKind::Transfer, patch) => patch.flatten(),
                (_, Some(patch)) => patch,
                (_, None) => old.category_id,
            };

            let new = Transaction {
                id: old.id,
                owner_id: old.owner_id.clone(),
                kind: new_kind,
                amount: cmd.amount.unwrap_or(old.amount),
                account_id,
                from_account_id,
                to_account_id,
                category_id,
                date: cmd.date.unwrap_or(old.date),
                time: cmd.time.unwrap_or(old.time),
                note: match cmd.note {
                    Some(note) => normalize_optional_text(note),
                    None => old.note.clone(),
                },
                parent_transaction_id: None,
                attachment: cmd.attachment.unwrap_or_else(|| old.attachment.clone()),
                created_at: old.created_at,
                updated_at: Utc::now(),
            };
            validate_amount(new.amount)?;
            validate_shape(
                new.kind,
                new.account_id,
                new.from_account_id,
                new.to_account_id,
                new.category_id,
            )?;
            self.resolve_endpoints(&db_tx, owner_id, &new).await?;
            let category = self.load_category(&db_tx, owner_id, new.category_id).await?;

            let old_fee = self.find_fee_child(&db_tx, old.id).await?;
            if new.kind == TransactionKind::Income
                && old_fee.is_some()
                && matches!(cmd.fee, FeePatch::Keep)
            {
                return Err(EngineError::InvalidTransaction(
                    "an income cannot carry a fee".to_string(),
                ));
            }

            let mut new_balances: HashMap<Uuid, i64> = HashMap::new();
            self.apply_effect(
                &db_tx,
                owner_id,
                &mut new_balances,
                &BalanceEffect::of(&old).reversed(),
            )
            .await?;
            self.apply_effect(&db_tx, owner_id, &mut new_balances, &BalanceEffect::of(&new))
                .await?;

            let new_fee = match (&cmd.fee, &old_fee) {
                (FeePatch::Keep, existing) => existing.clone(),
                (FeePatch::Remove, None) => None,
                (FeePatch::Remove, Some(fee)) => {
                    self.apply_effect(
                        &db_tx,
                        owner_id,
                        &mut new_balances,
                        &BalanceEffect::of(fee).reversed(),
                    )
                    .await?;
                    transactions::Entity::delete_by_id(fee.id.to_string())
                        .exec(&db_tx)
                        .await?;
                    None
                }
                (FeePatch::Set(spec), existing) => {
                    if let Some(fee) = existing {
                        self.apply_effect(
                            &db_tx,
                            owner_id,
                            &mut new_balances,
                            &BalanceEffect::of(fee).reversed(),
                        )
                        .await?;
                    }
                    let mut fee = self.build_fee(&new, spec)?;
                    if let Some(category_id) = fee.category_id {
                        self.require_category(&db_tx, owner_id, category_id).await?;
                    }
                    self.apply_effect(
                        &db_tx,
                        owner_id,
                        &mut new_balances,
                        &BalanceEffect::of(&fee),
                    )
                    .await?;
                    if let Some(existing) = existing {
                        // Rewrite in place to keep the fee row's identity.
                        fee.id = existing.id;
                        fee.created_at = existing.created_at;
                        transactions::ActiveModel::from(&fee).update(&db_tx).await?;
                    } else {
                        transactions::ActiveModel::from(&fee).insert(&db_tx).await?;
                    }
                    Some(fee)
                }
            };

            transactions::ActiveModel::from(&new).update(&db_tx).await?;
            self.persist_balances(&db_tx, new_balances).await?;

            Ok(TransactionRecord {
                transaction: new,
                fee: new_fee,
                category,
            })
        })
    }

    /// Deletes a transaction, reversing its effect and taking any fee child
    /// down with it. Deleting a fee row directly detaches only the fee.
    pub async fn delete_transaction(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<DeletedTransaction> {
        with_tx!(self, |db_tx| {
            let tx = self
                .require_transaction(&db_tx, owner_id, transaction_id)
                .await?;

            let mut new_balances: HashMap<Uuid, i64> = HashMap::new();
            let mut attachment_paths = Vec::new();

            self.apply_effect(
                &db_tx,
                owner_id,
                &mut new_balances,
                &BalanceEffect::of(&tx).reversed(),
            )
            .await?;
            if let Some(attachment) = &tx.attachment {
                attachment_paths.push(attachment.path.clone());
            }

            if !tx.is_fee()
                && let Some(fee) = self.find_fee_child(&db_tx, tx.id).await?
            {
                self.apply_effect(
                    &db_tx,
                    owner_id,
                    &mut new_balances,
                    &BalanceEffect::of(&fee).reversed(),
                )
                .await?;
                if let Some(attachment) = &fee.attachment {
                    attachment_paths.push(attachment.path.clone());
                }
                transactions::Entity::delete_by_id(fee.id.to_string())
                    .exec(&db_tx)
                    .await?;
            }

            transactions::Entity::delete_by_id(tx.id.to_string())
                .exec(&db_tx)
                .await?;
            self.persist_balances(&db_tx, new_balances).await?;

            Ok(DeletedTransaction {
                id: tx.id,
                attachment_paths,
            })
        })
    }

    pub async fn get_transaction(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<TransactionRecord> {
        with_tx!(self, |db_tx| {
            let tx = self
                .require_transaction(&db_tx, owner_id, transaction_id)
                .await?;
            let fee = if tx.is_fee() {
                None
            } else {
                self.find_fee_child(&db_tx, tx.id).await?
            };
            let category = self.load_category(&db_tx, owner_id, tx.category_id).await?;
            Ok(TransactionRecord {
                transaction: tx,
                fee,
                category,
            })
        })
    }

    /// Lists transactions newest first by `(date DESC, id DESC)`.
    pub async fn list_transactions(
        &self,
        owner_id: &str,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        validate_list_filter(filter)?;
        with_tx!(self, |db_tx| {
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::OwnerId.eq(owner_id.to_string()))
                .apply_tx_filters(filter)
                .order_by_desc(transactions::Column::Date)
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_desc(transactions::Column::Id);
            if let Some(limit) = filter.limit {
                query = query.limit(limit);
            }
            let models = query.all(&db_tx).await?;
            models.into_iter().map(Transaction::try_from).collect()
        })
    }
}
