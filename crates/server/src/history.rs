//! Balance history API endpoint

use api_types::history::{DayView, HistoryQuery, HistoryResponse};
use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::{ServerError, server::ServerState, user};

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(payload): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ServerError> {
    let history = state
        .engine
        .balance_history(&user.username, payload.account_id, payload.start, payload.end)
        .await?;

    Ok(Json(HistoryResponse {
        account_id: history.account_id,
        start: history.start,
        end: history.end,
        total_income: history.total_income,
        total_expense: history.total_expense,
        days: history
            .days
            .into_iter()
            .map(|day| DayView {
                date: day.date,
                balance: day.balance,
                income: day.income,
                expense: day.expense,
            })
            .collect(),
    }))
}
