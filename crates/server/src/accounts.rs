//! Accounts API endpoints

use api_types::account::{AccountListResponse, AccountNew, AccountRename, AccountView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_currency(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Eur => api_types::Currency::Eur,
        engine::Currency::Usd => api_types::Currency::Usd,
        engine::Currency::Gbp => api_types::Currency::Gbp,
    }
}

pub(crate) fn map_currency_in(currency: api_types::Currency) -> engine::Currency {
    match currency {
        api_types::Currency::Eur => engine::Currency::Eur,
        api_types::Currency::Usd => engine::Currency::Usd,
        api_types::Currency::Gbp => engine::Currency::Gbp,
    }
}

fn view(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
        currency: map_currency(account.currency),
        total_balance: account.total_balance,
        initial_balance: account.initial_balance,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let account = state
        .engine
        .create_account(
            &user.username,
            &payload.name,
            map_currency_in(payload.currency.unwrap_or_default()),
            payload.initial_balance.unwrap_or(0),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(view(account))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<AccountListResponse>, ServerError> {
    let accounts = state.engine.list_accounts(&user.username).await?;

    Ok(Json(AccountListResponse {
        accounts: accounts.into_iter().map(view).collect(),
    }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.get_account(&user.username, id).await?;

    Ok(Json(view(account)))
}

pub async fn rename(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccountRename>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .rename_account(&user.username, id, &payload.name)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_account(&user.username, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Rebuilds every cached balance of the caller from the transaction log.
pub async fn recompute(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.recompute_balances(&user.username).await?;

    Ok(StatusCode::NO_CONTENT)
}
