//! Transactions API endpoints

use api_types::transaction::{
    Attachment, FeeNew, FeeView, TransactionCreated, TransactionDeleted, TransactionList,
    TransactionListResponse, TransactionNew, TransactionUpdate, TransactionView,
    TransactionKind as ApiKind,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, attachments, categories, server::ServerState, user};

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Income => ApiKind::Income,
        engine::TransactionKind::Expense => ApiKind::Expense,
        engine::TransactionKind::Transfer => ApiKind::Transfer,
    }
}

fn map_kind_in(kind: ApiKind) -> engine::TransactionKind {
    match kind {
        ApiKind::Income => engine::TransactionKind::Income,
        ApiKind::Expense => engine::TransactionKind::Expense,
        ApiKind::Transfer => engine::TransactionKind::Transfer,
    }
}

fn map_attachment_in(attachment: Attachment) -> engine::AttachmentRef {
    engine::AttachmentRef {
        filename: attachment.filename,
        path: attachment.path,
        mime: attachment.mime,
    }
}

fn map_attachment(attachment: engine::AttachmentRef) -> Attachment {
    Attachment {
        filename: attachment.filename,
        path: attachment.path,
        mime: attachment.mime,
    }
}

fn map_fee_in(fee: FeeNew) -> engine::FeeSpec {
    engine::FeeSpec {
        amount: fee.amount,
        account_id: fee.account_id,
        category_id: fee.category_id,
        note: fee.note,
    }
}

fn fee_view(fee: engine::Transaction) -> Result<FeeView, ServerError> {
    let account_id = fee
        .account_id
        .ok_or_else(|| ServerError::Generic("fee row without account".to_string()))?;
    Ok(FeeView {
        id: fee.id,
        amount: fee.amount,
        account_id,
        category_id: fee.category_id,
        note: fee.note,
    })
}

fn view(
    tx: engine::Transaction,
    fee: Option<engine::Transaction>,
    category: Option<engine::Category>,
) -> Result<TransactionView, ServerError> {
    Ok(TransactionView {
        id: tx.id,
        kind: map_kind(tx.kind),
        amount: tx.amount,
        account_id: tx.account_id,
        from_account_id: tx.from_account_id,
        to_account_id: tx.to_account_id,
        category_id: tx.category_id,
        date: tx.date,
        time: tx.time,
        note: tx.note,
        parent_transaction_id: tx.parent_transaction_id,
        attachment: tx.attachment.map(map_attachment),
        fee: fee.map(fee_view).transpose()?,
        category: category.map(categories::view),
    })
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    let cmd = engine::CreateTransactionCmd {
        kind: map_kind_in(payload.kind),
        amount: payload.amount,
        account_id: payload.account_id,
        from_account_id: payload.from_account_id,
        to_account_id: payload.to_account_id,
        category_id: payload.category_id,
        date: payload.date,
        time: payload.time,
        note: payload.note,
        fee: payload.fee.map(map_fee_in),
        attachment: payload.attachment.map(map_attachment_in),
    };

    let record = state.engine.create_transaction(&user.username, cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(TransactionCreated {
            id: record.transaction.id,
        }),
    ))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let record = state.engine.get_transaction(&user.username, id).await?;

    Ok(Json(view(record.transaction, record.fee, record.category)?))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(payload): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = engine::TransactionListFilter {
        from: payload.from,
        to: payload.to,
        account_id: payload.account_id,
        kinds: payload
            .kinds
            .map(|kinds| kinds.into_iter().map(map_kind_in).collect()),
        include_fees: payload.include_fees.unwrap_or(false),
        limit: payload.limit,
    };

    let txs = state
        .engine
        .list_transactions(&user.username, &filter)
        .await?;

    let transactions = txs
        .into_iter()
        .map(|tx| view(tx, None, None))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(TransactionListResponse { transactions }))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    // An absent `fee` key leaves the linked fee alone; `null` removes it.
    let fee = match payload.fee {
        None => engine::FeePatch::Keep,
        Some(None) => engine::FeePatch::Remove,
        Some(Some(fee)) => engine::FeePatch::Set(map_fee_in(fee)),
    };

    let cmd = engine::UpdateTransactionCmd {
        kind: payload.kind.map(map_kind_in),
        amount: payload.amount,
        account_id: payload.account_id,
        from_account_id: payload.from_account_id,
        to_account_id: payload.to_account_id,
        category_id: payload.category_id,
        date: payload.date,
        time: payload.time,
        note: payload.note,
        fee,
        attachment: payload
            .attachment
            .map(|attachment| attachment.map(map_attachment_in)),
    };

    let record = state
        .engine
        .update_transaction(&user.username, id, cmd)
        .await?;

    Ok(Json(view(record.transaction, record.fee, record.category)?))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionDeleted>, ServerError> {
    let deleted = state.engine.delete_transaction(&user.username, id).await?;

    // Rows are gone at this point; losing a file only leaves an orphan on
    // disk, so the cleanup is best-effort after the commit.
    attachments::cleanup(&deleted.attachment_paths);

    Ok(Json(TransactionDeleted { id: deleted.id }))
}
