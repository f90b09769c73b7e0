use std::collections::HashMap;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    Account, BalanceEffect, Currency, EngineError, ResultEngine, accounts, transactions, users,
};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Checks the owner exists before hanging rows off their username.
    pub(super) async fn require_user(
        &self,
        db_tx: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<()> {
        let exists = users::Entity::find_by_id(username.to_string())
            .one(db_tx)
            .await?;
        if exists.is_none() {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }
        Ok(())
    }

    /// Loads an account row, scoped to its owner. A row owned by someone else
    /// is indistinguishable from a missing one.
    pub(super) async fn require_account(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
        account_id: Uuid,
    ) -> ResultEngine<accounts::Model> {
        accounts::Entity::find_by_id(account_id.to_string())
            .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }

    /// Accumulates a signed delta against an account's balance, seeding the
    /// entry from the stored value on first touch. Nothing is written until
    /// `persist_balances`.
    pub(super) async fn apply_account_delta(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
        new_balances: &mut HashMap<Uuid, i64>,
        account_id: Uuid,
        delta: i64,
    ) -> ResultEngine<()> {
        if let Some(entry) = new_balances.get_mut(&account_id) {
            *entry += delta;
            return Ok(());
        }
        let model = self.require_account(db_tx, owner_id, account_id).await?;
        new_balances.insert(account_id, model.total_balance + delta);
        Ok(())
    }

    /// Writes every simulated balance back, one partial update per account.
    pub(super) async fn persist_balances(
        &self,
        db_tx: &DatabaseTransaction,
        new_balances: HashMap<Uuid, i64>,
    ) -> ResultEngine<()> {
        for (account_id, total_balance) in new_balances {
            let model = accounts::ActiveModel {
                id: ActiveValue::Set(account_id.to_string()),
                total_balance: ActiveValue::Set(total_balance),
                ..Default::default()
            };
            model.update(db_tx).await?;
        }
        Ok(())
    }

    pub async fn create_account(
        &self,
        owner_id: &str,
        name: &str,
        currency: Currency,
        initial_balance: i64,
    ) -> ResultEngine<Account> {
        let name = normalize_required_name(name, "account")?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, owner_id).await?;
            let existing = accounts::Entity::find()
                .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
                .filter(accounts::Column::Name.eq(name.clone()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(name));
            }
            let account = Account::new(owner_id.to_string(), name, currency, initial_balance);
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            Ok(account)
        })
    }

    pub async fn get_account(&self, owner_id: &str, account_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, owner_id, account_id).await?;
            Account::try_from(model)
        })
    }

    pub async fn list_accounts(&self, owner_id: &str) -> ResultEngine<Vec<Account>> {
        with_tx!(self, |db_tx| {
            let models = accounts::Entity::find()
                .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
                .order_by_asc(accounts::Column::Name)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Account::try_from).collect()
        })
    }

    /// Renames an account. Balances and currency are immutable through this
    /// path: the balance belongs to the mutation engine and changing the
    /// currency would silently reinterpret every stored amount.
    pub async fn rename_account(
        &self,
        owner_id: &str,
        account_id: Uuid,
        name: &str,
    ) -> ResultEngine<()> {
        let name = normalize_required_name(name, "account")?;
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, owner_id, account_id).await?;
            let model = accounts::ActiveModel {
                id: ActiveValue::Set(account_id.to_string()),
                name: ActiveValue::Set(name),
                ..Default::default()
            };
            model.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Deletes an empty account. An account still referenced by transactions
    /// cannot go away without corrupting history, so the caller must delete
    /// or move those first.
    pub async fn delete_account(&self, owner_id: &str, account_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, owner_id, account_id).await?;
            let id = account_id.to_string();
            let referenced = transactions::Entity::find()
                .filter(transactions::Column::OwnerId.eq(owner_id.to_string()))
                .filter(
                    Condition::any()
                        .add(transactions::Column::AccountId.eq(id.clone()))
                        .add(transactions::Column::FromAccountId.eq(id.clone()))
                        .add(transactions::Column::ToAccountId.eq(id.clone())),
                )
                .count(&db_tx)
                .await?;
            if referenced > 0 {
                return Err(EngineError::InvalidTransaction(
                    "account still has transactions".to_string(),
                ));
            }
            model.delete(&db_tx).await?;
            Ok(())
        })
    }

    /// Rebuilds `total_balance` for every account of the owner by replaying
    /// the full transaction log forward from `initial_balance`. Normal
    /// operation never needs this; it exists to repair a ledger after manual
    /// database surgery and as a consistency check.
    pub async fn recompute_balances(&self, owner_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let account_models = accounts::Entity::find()
                .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
                .all(&db_tx)
                .await?;

            let mut balances: HashMap<Uuid, i64> = HashMap::new();
            for model in &account_models {
                let account = Account::try_from(model.clone())?;
                balances.insert(account.id, account.initial_balance);
            }

            let tx_models = transactions::Entity::find()
                .filter(transactions::Column::OwnerId.eq(owner_id.to_string()))
                .all(&db_tx)
                .await?;
            for tx_model in tx_models {
                let tx = crate::Transaction::try_from(tx_model)?;
                for delta in BalanceEffect::of(&tx).deltas() {
                    let entry = balances.get_mut(&delta.account_id).ok_or_else(|| {
                        EngineError::KeyNotFound("account not exists".to_string())
                    })?;
                    *entry += delta.delta;
                }
            }

            self.persist_balances(&db_tx, balances).await?;
            Ok(())
        })
    }
}
