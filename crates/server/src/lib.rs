use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod accounts;
mod attachments;
mod categories;
mod history;
mod server;
mod transactions;
mod user;

pub mod types {
    pub mod account {
        pub use api_types::account::{AccountListResponse, AccountNew, AccountRename, AccountView};
    }

    pub mod category {
        pub use api_types::category::{
            CategoryListResponse, CategoryNew, CategoryRename, CategoryView,
        };
    }

    pub mod transaction {
        pub use api_types::transaction::{
            Attachment, FeeNew, FeeView, TransactionCreated, TransactionDeleted, TransactionList,
            TransactionListResponse, TransactionNew, TransactionUpdate, TransactionView,
        };
    }

    pub mod history {
        pub use api_types::history::{DayView, HistoryQuery, HistoryResponse};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidTransaction(_)
        | EngineError::CurrencyMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
