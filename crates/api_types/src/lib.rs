use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
}

/// Deserializer for PATCH fields where an explicit `null` must stay
/// distinguishable from an absent key: absent stays `None`, `null` becomes
/// `Some(None)`, a value becomes `Some(Some(value))`. Always pair with
/// `#[serde(default)]`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
        pub currency: Option<Currency>,
        /// Starting balance in minor units; defaults to 0.
        pub initial_balance: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountRename {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub currency: Currency,
        pub total_balance: i64,
        pub initial_balance: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountListResponse {
        pub accounts: Vec<AccountView>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        /// Display hints only; the engine never interprets them.
        pub icon: Option<String>,
        pub color: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryRename {
        pub name: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub icon: Option<String>,
        pub color: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
        Transfer,
    }

    /// Attachment reference carried by a transaction. The file itself is
    /// managed outside the ledger database.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Attachment {
        pub filename: String,
        pub path: String,
        pub mime: Option<String>,
    }

    /// Fee to charge alongside an expense or transfer. Without an
    /// `account_id` the fee hits the paying account of the parent.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FeeNew {
        pub amount: i64,
        pub account_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub kind: TransactionKind,
        /// Must be > 0; the kind defines the sign.
        pub amount: i64,
        /// Income/expense only.
        pub account_id: Option<Uuid>,
        /// Transfer only.
        pub from_account_id: Option<Uuid>,
        /// Transfer only.
        pub to_account_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub date: NaiveDate,
        pub time: Option<NaiveTime>,
        pub note: Option<String>,
        pub fee: Option<FeeNew>,
        pub attachment: Option<Attachment>,
    }

    /// Partial update. Absent keys leave the stored value alone; for the
    /// nullable fields an explicit `null` clears the value. For `fee`,
    /// `null` removes the linked fee and an object creates or rewrites it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub kind: Option<TransactionKind>,
        pub amount: Option<i64>,
        pub account_id: Option<Uuid>,
        pub from_account_id: Option<Uuid>,
        pub to_account_id: Option<Uuid>,
        #[serde(default, deserialize_with = "double_option")]
        pub category_id: Option<Option<Uuid>>,
        pub date: Option<NaiveDate>,
        #[serde(default, deserialize_with = "double_option")]
        pub time: Option<Option<NaiveTime>>,
        #[serde(default, deserialize_with = "double_option")]
        pub note: Option<Option<String>>,
        #[serde(default, deserialize_with = "double_option")]
        pub fee: Option<Option<FeeNew>>,
        #[serde(default, deserialize_with = "double_option")]
        pub attachment: Option<Option<Attachment>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeeView {
        pub id: Uuid,
        pub amount: i64,
        pub account_id: Uuid,
        pub category_id: Option<Uuid>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub amount: i64,
        pub account_id: Option<Uuid>,
        pub from_account_id: Option<Uuid>,
        pub to_account_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub date: NaiveDate,
        pub time: Option<NaiveTime>,
        pub note: Option<String>,
        /// Set when this row is itself a fee of another transaction.
        pub parent_transaction_id: Option<Uuid>,
        pub attachment: Option<Attachment>,
        pub fee: Option<FeeView>,
        /// Denormalized category, for display.
        pub category: Option<super::category::CategoryView>,
    }

    /// `kinds` arrives as a comma separated list (`kinds=income,expense`);
    /// the query string cannot carry a repeated key through `Query`.
    fn kind_list<'de, D>(deserializer: D) -> Result<Option<Vec<TransactionKind>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Deserialize::deserialize(deserializer)?;
        raw.map(|raw| {
            raw.split(',')
                .map(|kind| match kind.trim() {
                    "income" => Ok(TransactionKind::Income),
                    "expense" => Ok(TransactionKind::Expense),
                    "transfer" => Ok(TransactionKind::Transfer),
                    other => Err(serde::de::Error::custom(format!("unknown kind: {other}"))),
                })
                .collect()
        })
        .transpose()
    }

    /// Query string for listing transactions; `from`/`to` are inclusive.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        pub account_id: Option<Uuid>,
        /// Comma separated kind allow-list, e.g. `kinds=income,expense`.
        #[serde(default, deserialize_with = "kind_list")]
        pub kinds: Option<Vec<TransactionKind>>,
        pub include_fees: Option<bool>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionDeleted {
        pub id: Uuid,
    }
}

pub mod history {
    use super::*;

    /// Query string for the daily balance series. Without `account_id` the
    /// series aggregates every account of the caller.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct HistoryQuery {
        pub account_id: Option<Uuid>,
        pub start: NaiveDate,
        pub end: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DayView {
        pub date: NaiveDate,
        /// End-of-day balance in minor units.
        pub balance: i64,
        pub income: i64,
        pub expense: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HistoryResponse {
        pub account_id: Option<Uuid>,
        pub start: NaiveDate,
        pub end: NaiveDate,
        pub days: Vec<DayView>,
        pub total_income: i64,
        pub total_expense: i64,
    }
}

#[cfg(test)]
mod tests {
    use super::transaction::{TransactionKind, TransactionList, TransactionUpdate};

    #[test]
    fn kind_list_parses_comma_separated() {
        let list: TransactionList =
            serde_json::from_str(r#"{"kinds": "income,expense"}"#).unwrap();
        assert_eq!(
            list.kinds,
            Some(vec![TransactionKind::Income, TransactionKind::Expense])
        );

        let list: TransactionList = serde_json::from_str("{}").unwrap();
        assert!(list.kinds.is_none());

        assert!(serde_json::from_str::<TransactionList>(r#"{"kinds": "refund"}"#).is_err());
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: TransactionUpdate = serde_json::from_str(r#"{"amount": 100}"#).unwrap();
        assert_eq!(patch.amount, Some(100));
        assert!(patch.fee.is_none());
        assert!(patch.note.is_none());

        let patch: TransactionUpdate =
            serde_json::from_str(r#"{"fee": null, "note": null}"#).unwrap();
        assert_eq!(patch.fee, Some(None));
        assert_eq!(patch.note, Some(None));

        let patch: TransactionUpdate =
            serde_json::from_str(r#"{"fee": {"amount": 50}}"#).unwrap();
        assert!(matches!(patch.fee, Some(Some(ref fee)) if fee.amount == 50));
    }
}
