//! Transaction primitives.
//!
//! A transaction is the only thing that moves money. Three kinds exist:
//!
//! - `Income`: credits a single account;
//! - `Expense`: debits a single account;
//! - `Transfer`: debits `from_account_id` and credits `to_account_id`.
//!
//! An expense or transfer may carry one linked fee: a child expense row whose
//! `parent_transaction_id` points back at it. The fee is always an expense on
//! the account paying it and is created, rewritten and deleted together with
//! its parent.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, commands::AttachmentRef};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
}

impl TransactionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
            TransactionKind::Transfer => "transfer",
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            "transfer" => Ok(TransactionKind::Transfer),
            other => Err(EngineError::InvalidTransaction(format!(
                "unknown transaction kind: {other}"
            ))),
        }
    }
}

/// A persisted ledger movement.
///
/// The account fields depend on `kind`: income/expense use `account_id` and
/// leave the transfer endpoints empty, transfers use `from_account_id` and
/// `to_account_id` and leave `account_id` empty. `amount` is always a
/// positive number of minor units; the sign is implied by the kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner_id: String,
    pub kind: TransactionKind,
    pub amount: i64,
    pub account_id: Option<Uuid>,
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub note: Option<String>,
    /// Set on fee rows only, pointing at the expense/transfer that pays it.
    pub parent_transaction_id: Option<Uuid>,
    pub attachment: Option<AttachmentRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Whether this row is a fee child of another transaction.
    #[must_use]
    pub const fn is_fee(&self) -> bool {
        self.parent_transaction_id.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub kind: String,
    pub amount: i64,
    pub account_id: Option<String>,
    pub from_account_id: Option<String>,
    pub to_account_id: Option<String>,
    pub category_id: Option<String>,
    pub date: Date,
    pub time: Option<Time>,
    pub note: Option<String>,
    pub parent_transaction_id: Option<String>,
    pub attachment_name: Option<String>,
    pub attachment_path: Option<String>,
    pub attachment_mime: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            owner_id: ActiveValue::Set(tx.owner_id.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount: ActiveValue::Set(tx.amount),
            account_id: ActiveValue::Set(tx.account_id.map(|id| id.to_string())),
            from_account_id: ActiveValue::Set(tx.from_account_id.map(|id| id.to_string())),
            to_account_id: ActiveValue::Set(tx.to_account_id.map(|id| id.to_string())),
            category_id: ActiveValue::Set(tx.category_id.map(|id| id.to_string())),
            date: ActiveValue::Set(tx.date),
            time: ActiveValue::Set(tx.time),
            note: ActiveValue::Set(tx.note.clone()),
            parent_transaction_id: ActiveValue::Set(
                tx.parent_transaction_id.map(|id| id.to_string()),
            ),
            attachment_name: ActiveValue::Set(
                tx.attachment.as_ref().map(|a| a.filename.clone()),
            ),
            attachment_path: ActiveValue::Set(tx.attachment.as_ref().map(|a| a.path.clone())),
            attachment_mime: ActiveValue::Set(
                tx.attachment.as_ref().and_then(|a| a.mime.clone()),
            ),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

fn parse_uuid(value: &str, what: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::KeyNotFound(format!("{what} not exists")))
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let attachment = match (model.attachment_name, model.attachment_path) {
            (Some(filename), Some(path)) => Some(AttachmentRef {
                filename,
                path,
                mime: model.attachment_mime,
            }),
            _ => None,
        };
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            owner_id: model.owner_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: model.amount,
            account_id: model
                .account_id
                .as_deref()
                .map(|id| parse_uuid(id, "account"))
                .transpose()?,
            from_account_id: model
                .from_account_id
                .as_deref()
                .map(|id| parse_uuid(id, "account"))
                .transpose()?,
            to_account_id: model
                .to_account_id
                .as_deref()
                .map(|id| parse_uuid(id, "account"))
                .transpose()?,
            category_id: model
                .category_id
                .as_deref()
                .map(|id| parse_uuid(id, "category"))
                .transpose()?,
            date: model.date,
            time: model.time,
            note: model.note,
            parent_transaction_id: model
                .parent_transaction_id
                .as_deref()
                .map(|id| parse_uuid(id, "transaction"))
                .transpose()?,
            attachment,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
