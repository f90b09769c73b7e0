//! Account primitives.
//!
//! An account is anywhere money is kept (cash, bank account, card). Its
//! `total_balance` is denormalized state: always `initial_balance` plus the
//! sum of signed effects of every persisted transaction referencing it.
//! User-facing flows never write the balance directly; only the engine
//! operations do.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier, generated once and persisted.
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub currency: Currency,
    /// Cached running balance in minor units.
    pub total_balance: i64,
    pub initial_balance: i64,
}

impl Account {
    pub fn new(
        owner_id: String,
        name: String,
        currency: Currency,
        initial_balance: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            currency,
            total_balance: initial_balance,
            initial_balance,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub currency: String,
    pub total_balance: i64,
    pub initial_balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            owner_id: ActiveValue::Set(account.owner_id.clone()),
            name: ActiveValue::Set(account.name.clone()),
            currency: ActiveValue::Set(account.currency.code().to_string()),
            total_balance: ActiveValue::Set(account.total_balance),
            initial_balance: ActiveValue::Set(account.initial_balance),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("account not exists".to_string()))?,
            owner_id: model.owner_id,
            name: model.name,
            currency: Currency::try_from(model.currency.as_str())?,
            total_balance: model.total_balance,
            initial_balance: model.initial_balance,
        })
    }
}
