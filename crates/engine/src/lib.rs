//! Ledger balance engine.
//!
//! The engine owns the two invariant-critical paths of the ledger:
//!
//! - the **mutation path** (`ops::transactions`): create/update/delete a
//!   transaction (and its optional linked fee row) while keeping every
//!   account's cached `total_balance` consistent, all inside one database
//!   transaction;
//! - the **history path** (`ops::history`): reconstruct daily
//!   balance/income/expense series for a date window by replaying the
//!   transaction log backward from the live balance, without stored
//!   snapshots.
//!
//! Account balances are cached/derived state: `total_balance` always equals
//! `initial_balance` plus the sum of signed effects of every persisted
//! transaction referencing the account. The only writers are the engine
//! operations in `ops`; nothing else may touch the column.

pub use accounts::Account;
pub use categories::Category;
pub use commands::{
    AttachmentRef, CreateTransactionCmd, FeePatch, FeeSpec, UpdateTransactionCmd,
};
pub use currency::Currency;
pub use effects::{AccountDelta, BalanceEffect};
pub use error::EngineError;
pub use ops::{
    BalanceHistory, DayBucket, DeletedTransaction, Engine, EngineBuilder,
    TransactionListFilter, TransactionRecord,
};
pub use transactions::{Transaction, TransactionKind};

pub mod accounts;
pub mod categories;
mod commands;
mod currency;
mod effects;
mod error;
mod ops;
pub mod transactions;
pub mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
