//! Command payloads accepted by the engine operations.
//!
//! Commands carry caller intent only; validation and balance bookkeeping
//! happen inside `ops` once the command reaches a database transaction.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::transactions::TransactionKind;

/// Pointer to an uploaded attachment. The engine persists the reference; the
/// file itself lives outside the database and is cleaned up by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub filename: String,
    pub path: String,
    pub mime: Option<String>,
}

/// Requested fee for an expense or transfer.
///
/// The fee becomes a child expense row. When `account_id` is empty it falls
/// back to the paying account of the parent (`account_id` for an expense,
/// `from_account_id` for a transfer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSpec {
    pub amount: i64,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub note: Option<String>,
}

impl FeeSpec {
    pub fn new(amount: i64) -> Self {
        Self {
            amount,
            account_id: None,
            category_id: None,
            note: None,
        }
    }

    #[must_use]
    pub fn on_account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// What an update does to the linked fee. Distinguishing "leave it alone"
/// from "remove it" is why this is not an `Option<FeeSpec>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FeePatch {
    /// Existing fee (or absence of one) is untouched.
    #[default]
    Keep,
    /// Existing fee is deleted and its effect reversed.
    Remove,
    /// Fee is created or rewritten to match the spec.
    Set(FeeSpec),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateTransactionCmd {
    pub kind: TransactionKind,
    pub amount: i64,
    pub account_id: Option<Uuid>,
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub note: Option<String>,
    pub fee: Option<FeeSpec>,
    pub attachment: Option<AttachmentRef>,
}

impl CreateTransactionCmd {
    pub fn income(account_id: Uuid, amount: i64, date: NaiveDate) -> Self {
        Self::bare(TransactionKind::Income, amount, date).on_account(account_id)
    }

    pub fn expense(account_id: Uuid, amount: i64, date: NaiveDate) -> Self {
        Self::bare(TransactionKind::Expense, amount, date).on_account(account_id)
    }

    pub fn transfer(from: Uuid, to: Uuid, amount: i64, date: NaiveDate) -> Self {
        let mut cmd = Self::bare(TransactionKind::Transfer, amount, date);
        cmd.from_account_id = Some(from);
        cmd.to_account_id = Some(to);
        cmd
    }

    fn bare(kind: TransactionKind, amount: i64, date: NaiveDate) -> Self {
        Self {
            kind,
            amount,
            account_id: None,
            from_account_id: None,
            to_account_id: None,
            category_id: None,
            date,
            time: None,
            note: None,
            fee: None,
            attachment: None,
        }
    }

    #[must_use]
    fn on_account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn with_fee(mut self, fee: FeeSpec) -> Self {
        self.fee = Some(fee);
        self
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: AttachmentRef) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Partial rewrite of an existing transaction.
///
/// Unset fields keep their stored value. Nullable columns use a nested
/// `Option` so "set to empty" and "leave untouched" stay distinct. The
/// update path always reverses the old effect and applies the new one, so a
/// kind change (say expense to transfer) is just another update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateTransactionCmd {
    pub kind: Option<TransactionKind>,
    pub amount: Option<i64>,
    pub account_id: Option<Uuid>,
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub category_id: Option<Option<Uuid>>,
    pub date: Option<NaiveDate>,
    pub time: Option<Option<NaiveTime>>,
    pub note: Option<Option<String>>,
    pub fee: FeePatch,
    pub attachment: Option<Option<AttachmentRef>>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn set_amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn set_kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn set_account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn set_endpoints(mut self, from: Uuid, to: Uuid) -> Self {
        self.from_account_id = Some(from);
        self.to_account_id = Some(to);
        self
    }

    #[must_use]
    pub fn set_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn set_note(mut self, note: Option<String>) -> Self {
        self.note = Some(note);
        self
    }

    #[must_use]
    pub fn set_fee(mut self, fee: FeePatch) -> Self {
        self.fee = fee;
        self
    }
}
