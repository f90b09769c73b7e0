use chrono::{NaiveDate, NaiveTime};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AttachmentRef, CreateTransactionCmd, Currency, Engine, EngineError, FeePatch, FeeSpec,
    TransactionKind, TransactionListFilter, UpdateTransactionCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["alice".into(), "password".into()],
    ))
    .await
    .unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn balance(engine: &Engine, account_id: Uuid) -> i64 {
    engine
        .get_account("alice", account_id)
        .await
        .unwrap()
        .total_balance
}

/// One account and one category, the minimum to move money around.
async fn seed(engine: &Engine) -> (Uuid, Uuid) {
    let account = engine
        .create_account("alice", "Cash", Currency::Eur, 0)
        .await
        .unwrap();
    let category = engine
        .create_category("alice", "Groceries", None, None)
        .await
        .unwrap();
    (account.id, category.id)
}

#[tokio::test]
async fn income_credits_the_account() {
    let (engine, _db) = engine_with_db().await;
    let (account, category) = seed(&engine).await;

    let record = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::income(account, 10_000, day(2024, 1, 5))
                .with_category(category),
        )
        .await
        .unwrap();

    assert_eq!(record.transaction.kind, TransactionKind::Income);
    assert!(record.fee.is_none());
    assert_eq!(record.category.as_ref().map(|c| c.name.as_str()), Some("Groceries"));
    assert_eq!(balance(&engine, account).await, 10_000);
}

#[tokio::test]
async fn category_display_hints_come_back_denormalized() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account("alice", "Cash", Currency::Eur, 0)
        .await
        .unwrap();
    let category = engine
        .create_category(
            "alice",
            "Rent",
            Some("house".to_string()),
            Some("#aa3355".to_string()),
        )
        .await
        .unwrap();

    let record = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(account.id, 90_000, day(2024, 1, 1))
                .with_category(category.id),
        )
        .await
        .unwrap();

    let denormalized = record.category.expect("category missing");
    assert_eq!(denormalized.icon.as_deref(), Some("house"));
    assert_eq!(denormalized.color.as_deref(), Some("#aa3355"));
}

#[tokio::test]
async fn expense_debits_and_respects_initial_balance() {
    let (engine, _db) = engine_with_db().await;
    let (_, category) = seed(&engine).await;
    let account = engine
        .create_account("alice", "Bank", Currency::Eur, 5_000)
        .await
        .unwrap();

    engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(account.id, 1_200, day(2024, 2, 1))
                .with_category(category)
                .with_note("  dinner  "),
        )
        .await
        .unwrap();

    assert_eq!(balance(&engine, account.id).await, 3_800);

    let txs = engine
        .list_transactions("alice", &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].note.as_deref(), Some("dinner"));
}

#[tokio::test]
async fn transfer_with_fee_charges_the_source() {
    let (engine, _db) = engine_with_db().await;
    let a = engine
        .create_account("alice", "A", Currency::Eur, 0)
        .await
        .unwrap();
    let b = engine
        .create_account("alice", "B", Currency::Eur, 0)
        .await
        .unwrap();

    let record = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::transfer(a.id, b.id, 5_000, day(2024, 3, 1))
                .with_fee(FeeSpec::new(100)),
        )
        .await
        .unwrap();

    assert_eq!(balance(&engine, a.id).await, -5_100);
    assert_eq!(balance(&engine, b.id).await, 5_000);

    let fee = record.fee.expect("fee row missing");
    assert_eq!(fee.kind, TransactionKind::Expense);
    assert_eq!(fee.account_id, Some(a.id));
    assert_eq!(fee.parent_transaction_id, Some(record.transaction.id));

    // A fee can be routed to an account other than the paying one.
    let routed = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::transfer(a.id, b.id, 1_000, day(2024, 3, 2))
                .with_fee(FeeSpec::new(20).on_account(b.id)),
        )
        .await
        .unwrap();
    assert_eq!(routed.fee.as_ref().unwrap().account_id, Some(b.id));
    assert_eq!(balance(&engine, a.id).await, -6_100);
    assert_eq!(balance(&engine, b.id).await, 5_980);
    engine
        .delete_transaction("alice", routed.transaction.id)
        .await
        .unwrap();

    // Deleting the parent takes the fee down and restores both balances.
    let deleted = engine
        .delete_transaction("alice", record.transaction.id)
        .await
        .unwrap();
    assert_eq!(deleted.id, record.transaction.id);
    assert_eq!(balance(&engine, a.id).await, 0);
    assert_eq!(balance(&engine, b.id).await, 0);

    assert!(matches!(
        engine.get_transaction("alice", record.transaction.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.get_transaction("alice", fee.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn create_rejects_bad_shapes_before_writing() {
    let (engine, _db) = engine_with_db().await;
    let (account, category) = seed(&engine).await;
    let other = engine
        .create_account("alice", "USD", Currency::Usd, 0)
        .await
        .unwrap();

    let err = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::income(account, 0, day(2024, 1, 1)).with_category(category),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    // Income and expense both need a category.
    let err = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::income(account, 100, day(2024, 1, 1)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransaction(_)));

    let err = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::transfer(account, account, 100, day(2024, 1, 1)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransaction(_)));

    let err = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::income(account, 100, day(2024, 1, 1))
                .with_category(category)
                .with_fee(FeeSpec::new(10)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransaction(_)));

    let err = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::transfer(account, other.id, 100, day(2024, 1, 1)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CurrencyMismatch(_)));

    assert_eq!(balance(&engine, account).await, 0);
    assert_eq!(balance(&engine, other.id).await, 0);
}

#[tokio::test]
async fn failed_create_leaves_no_trace() {
    let (engine, _db) = engine_with_db().await;
    let (account, _) = seed(&engine).await;

    let err = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(account, 500, day(2024, 1, 1))
                .with_category(Uuid::new_v4()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    assert_eq!(balance(&engine, account).await, 0);
    let txs = engine
        .list_transactions("alice", &TransactionListFilter::default())
        .await
        .unwrap();
    assert!(txs.is_empty());
}

#[tokio::test]
async fn empty_update_is_a_noop_for_balances() {
    let (engine, _db) = engine_with_db().await;
    let (account, category) = seed(&engine).await;

    let record = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(account, 700, day(2024, 1, 1)).with_category(category),
        )
        .await
        .unwrap();
    assert_eq!(balance(&engine, account).await, -700);

    let updated = engine
        .update_transaction(
            "alice",
            record.transaction.id,
            UpdateTransactionCmd::default(),
        )
        .await
        .unwrap();

    assert_eq!(balance(&engine, account).await, -700);
    assert_eq!(updated.transaction.amount, 700);
    assert_eq!(updated.transaction.kind, TransactionKind::Expense);
    assert_eq!(updated.transaction.category_id, Some(category));
}

#[tokio::test]
async fn update_amount_reverses_then_reapplies() {
    let (engine, _db) = engine_with_db().await;
    let (account, category) = seed(&engine).await;

    let record = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::income(account, 1_000, day(2024, 1, 1))
                .with_category(category),
        )
        .await
        .unwrap();

    engine
        .update_transaction(
            "alice",
            record.transaction.id,
            UpdateTransactionCmd::default().set_amount(2_500),
        )
        .await
        .unwrap();

    assert_eq!(balance(&engine, account).await, 2_500);
}

#[tokio::test]
async fn update_kind_expense_to_transfer() {
    let (engine, _db) = engine_with_db().await;
    let (_, category) = seed(&engine).await;
    let a = engine
        .create_account("alice", "A", Currency::Eur, 0)
        .await
        .unwrap();
    let b = engine
        .create_account("alice", "B", Currency::Eur, 0)
        .await
        .unwrap();

    let record = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(a.id, 2_000, day(2024, 1, 1)).with_category(category),
        )
        .await
        .unwrap();
    assert_eq!(balance(&engine, a.id).await, -2_000);

    let updated = engine
        .update_transaction(
            "alice",
            record.transaction.id,
            UpdateTransactionCmd::default()
                .set_kind(TransactionKind::Transfer)
                .set_endpoints(a.id, b.id),
        )
        .await
        .unwrap();

    assert_eq!(balance(&engine, a.id).await, -2_000);
    assert_eq!(balance(&engine, b.id).await, 2_000);
    assert_eq!(updated.transaction.kind, TransactionKind::Transfer);
    // Transfers carry no category, so the old one is dropped.
    assert_eq!(updated.transaction.category_id, None);
    assert_eq!(updated.transaction.account_id, None);
}

#[tokio::test]
async fn fee_patch_keep_set_remove() {
    let (engine, _db) = engine_with_db().await;
    let (account, category) = seed(&engine).await;

    let record = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(account, 1_000, day(2024, 1, 1))
                .with_category(category)
                .with_fee(FeeSpec::new(100)),
        )
        .await
        .unwrap();
    assert_eq!(balance(&engine, account).await, -1_100);
    let fee_id = record.fee.as_ref().unwrap().id;

    // Keep: untouched even while other fields change.
    let kept = engine
        .update_transaction(
            "alice",
            record.transaction.id,
            UpdateTransactionCmd::default().set_amount(1_500),
        )
        .await
        .unwrap();
    assert_eq!(balance(&engine, account).await, -1_600);
    assert_eq!(kept.fee.as_ref().unwrap().id, fee_id);
    assert_eq!(kept.fee.as_ref().unwrap().amount, 100);

    // Set: rewrites the existing row in place.
    let set = engine
        .update_transaction(
            "alice",
            record.transaction.id,
            UpdateTransactionCmd::default()
                .set_fee(FeePatch::Set(FeeSpec::new(250).with_note("card fee"))),
        )
        .await
        .unwrap();
    assert_eq!(balance(&engine, account).await, -1_750);
    assert_eq!(set.fee.as_ref().unwrap().id, fee_id);
    assert_eq!(set.fee.as_ref().unwrap().amount, 250);
    assert_eq!(set.fee.as_ref().unwrap().note.as_deref(), Some("card fee"));

    // Remove: fee row gone, its effect reversed.
    let removed = engine
        .update_transaction(
            "alice",
            record.transaction.id,
            UpdateTransactionCmd::default().set_fee(FeePatch::Remove),
        )
        .await
        .unwrap();
    assert_eq!(balance(&engine, account).await, -1_500);
    assert!(removed.fee.is_none());
    assert!(matches!(
        engine.get_transaction("alice", fee_id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn kind_change_to_income_rejected_while_fee_kept() {
    let (engine, _db) = engine_with_db().await;
    let (account, category) = seed(&engine).await;

    let record = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(account, 1_000, day(2024, 1, 1))
                .with_category(category)
                .with_fee(FeeSpec::new(100)),
        )
        .await
        .unwrap();

    let err = engine
        .update_transaction(
            "alice",
            record.transaction.id,
            UpdateTransactionCmd::default().set_kind(TransactionKind::Income),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransaction(_)));

    // Removing the fee in the same update makes the kind change legal.
    engine
        .update_transaction(
            "alice",
            record.transaction.id,
            UpdateTransactionCmd::default()
                .set_kind(TransactionKind::Income)
                .set_fee(FeePatch::Remove),
        )
        .await
        .unwrap();
    assert_eq!(balance(&engine, account).await, 1_000);
}

#[tokio::test]
async fn fee_rows_are_edited_through_their_parent() {
    let (engine, _db) = engine_with_db().await;
    let (account, category) = seed(&engine).await;

    let record = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(account, 1_000, day(2024, 1, 1))
                .with_category(category)
                .with_fee(FeeSpec::new(100)),
        )
        .await
        .unwrap();
    let fee_id = record.fee.unwrap().id;

    let err = engine
        .update_transaction("alice", fee_id, UpdateTransactionCmd::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransaction(_)));

    // Deleting the fee directly detaches only the fee.
    engine.delete_transaction("alice", fee_id).await.unwrap();
    assert_eq!(balance(&engine, account).await, -1_000);
    let parent = engine
        .get_transaction("alice", record.transaction.id)
        .await
        .unwrap();
    assert!(parent.fee.is_none());
}

#[tokio::test]
async fn create_then_delete_round_trips_balances() {
    let (engine, _db) = engine_with_db().await;
    let (_, category) = seed(&engine).await;
    let account = engine
        .create_account("alice", "Bank", Currency::Eur, 4_321)
        .await
        .unwrap();

    let record = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(account.id, 999, day(2024, 1, 1))
                .with_category(category),
        )
        .await
        .unwrap();
    engine
        .delete_transaction("alice", record.transaction.id)
        .await
        .unwrap();

    assert_eq!(balance(&engine, account.id).await, 4_321);
}

#[tokio::test]
async fn rows_are_scoped_to_their_owner() {
    let (engine, db) = engine_with_db().await;
    let (account, category) = seed(&engine).await;
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["bob".into(), "password".into()],
    ))
    .await
    .unwrap();

    let record = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::income(account, 100, day(2024, 1, 1)).with_category(category),
        )
        .await
        .unwrap();

    assert!(matches!(
        engine.get_account("bob", account).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.get_transaction("bob", record.transaction.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine
            .delete_transaction("bob", record.transaction.id)
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert_eq!(balance(&engine, account).await, 100);
}

#[tokio::test]
async fn recompute_restores_a_corrupted_balance() {
    let (engine, db) = engine_with_db().await;
    let (account, category) = seed(&engine).await;

    engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::income(account, 1_000, day(2024, 1, 1))
                .with_category(category),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(account, 300, day(2024, 1, 2)).with_category(category),
        )
        .await
        .unwrap();

    // Manual surgery behind the engine's back.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE accounts SET total_balance = ? WHERE id = ?",
        vec![999_999.into(), account.to_string().into()],
    ))
    .await
    .unwrap();
    assert_eq!(balance(&engine, account).await, 999_999);

    engine.recompute_balances("alice").await.unwrap();
    assert_eq!(balance(&engine, account).await, 700);
}

#[tokio::test]
async fn referenced_account_cannot_be_deleted() {
    let (engine, _db) = engine_with_db().await;
    let (account, category) = seed(&engine).await;

    let record = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(account, 100, day(2024, 1, 1)).with_category(category),
        )
        .await
        .unwrap();

    let err = engine.delete_account("alice", account).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransaction(_)));

    engine
        .delete_transaction("alice", record.transaction.id)
        .await
        .unwrap();
    engine.delete_account("alice", account).await.unwrap();
}

#[tokio::test]
async fn duplicate_names_conflict() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;

    assert!(matches!(
        engine.create_account("alice", "Cash", Currency::Eur, 0).await,
        Err(EngineError::ExistingKey(_))
    ));
    assert!(matches!(
        engine.create_category("alice", "Groceries", None, None).await,
        Err(EngineError::ExistingKey(_))
    ));
}

#[tokio::test]
async fn list_filters_by_window_account_and_fees() {
    let (engine, _db) = engine_with_db().await;
    let (_, category) = seed(&engine).await;
    let a = engine
        .create_account("alice", "A", Currency::Eur, 0)
        .await
        .unwrap();
    let b = engine
        .create_account("alice", "B", Currency::Eur, 0)
        .await
        .unwrap();

    engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::income(a.id, 100, day(2024, 1, 1)).with_category(category),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::transfer(a.id, b.id, 50, day(2024, 1, 2))
                .with_fee(FeeSpec::new(5)),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(b.id, 30, day(2024, 1, 5)).with_category(category),
        )
        .await
        .unwrap();

    // Fee rows are hidden unless asked for.
    let all = engine
        .list_transactions("alice", &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let with_fees = engine
        .list_transactions(
            "alice",
            &TransactionListFilter {
                include_fees: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(with_fees.len(), 4);

    let windowed = engine
        .list_transactions(
            "alice",
            &TransactionListFilter {
                from: Some(day(2024, 1, 2)),
                to: Some(day(2024, 1, 2)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(windowed.len(), 1);
    assert_eq!(windowed[0].kind, TransactionKind::Transfer);

    let only_b = engine
        .list_transactions(
            "alice",
            &TransactionListFilter {
                account_id: Some(b.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(only_b.len(), 2);

    // Newest first, capped.
    let latest = engine
        .list_transactions(
            "alice",
            &TransactionListFilter {
                limit: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].date, day(2024, 1, 5));

    assert!(matches!(
        engine
            .list_transactions(
                "alice",
                &TransactionListFilter {
                    from: Some(day(2024, 2, 1)),
                    to: Some(day(2024, 1, 1)),
                    ..Default::default()
                },
            )
            .await,
        Err(EngineError::InvalidTransaction(_))
    ));
}

#[tokio::test]
async fn list_honors_the_kind_allow_list() {
    let (engine, _db) = engine_with_db().await;
    let (_, category) = seed(&engine).await;
    let a = engine
        .create_account("alice", "A", Currency::Eur, 0)
        .await
        .unwrap();
    let b = engine
        .create_account("alice", "B", Currency::Eur, 0)
        .await
        .unwrap();

    engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::income(a.id, 100, day(2024, 1, 1)).with_category(category),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(a.id, 40, day(2024, 1, 2)).with_category(category),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::transfer(a.id, b.id, 10, day(2024, 1, 3)),
        )
        .await
        .unwrap();

    let incomes = engine
        .list_transactions(
            "alice",
            &TransactionListFilter {
                kinds: Some(vec![TransactionKind::Income]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(incomes.len(), 1);
    assert_eq!(incomes[0].kind, TransactionKind::Income);

    let moving = engine
        .list_transactions(
            "alice",
            &TransactionListFilter {
                kinds: Some(vec![TransactionKind::Income, TransactionKind::Transfer]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moving.len(), 2);

    // An empty allow-list is a caller bug, not "match nothing".
    assert!(matches!(
        engine
            .list_transactions(
                "alice",
                &TransactionListFilter {
                    kinds: Some(vec![]),
                    ..Default::default()
                },
            )
            .await,
        Err(EngineError::InvalidTransaction(_))
    ));
}

#[tokio::test]
async fn time_and_attachment_round_trip() {
    let (engine, _db) = engine_with_db().await;
    let (account, category) = seed(&engine).await;

    let record = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(account, 2_400, day(2024, 5, 1))
                .with_category(category)
                .with_time(NaiveTime::from_hms_opt(13, 45, 0).unwrap())
                .with_attachment(AttachmentRef {
                    filename: "receipt.pdf".to_string(),
                    path: "attachments/receipt.pdf".to_string(),
                    mime: Some("application/pdf".to_string()),
                }),
        )
        .await
        .unwrap();

    let fetched = engine
        .get_transaction("alice", record.transaction.id)
        .await
        .unwrap();
    assert_eq!(fetched.transaction.time, NaiveTime::from_hms_opt(13, 45, 0));
    let attachment = fetched.transaction.attachment.expect("attachment missing");
    assert_eq!(attachment.filename, "receipt.pdf");
    assert_eq!(attachment.mime.as_deref(), Some("application/pdf"));

    // The delete reports the stored path so the caller can unlink the file.
    let deleted = engine
        .delete_transaction("alice", record.transaction.id)
        .await
        .unwrap();
    assert_eq!(
        deleted.attachment_paths,
        vec!["attachments/receipt.pdf".to_string()]
    );
}

#[tokio::test]
async fn update_moves_an_expense_to_another_account() {
    let (engine, _db) = engine_with_db().await;
    let (_, category) = seed(&engine).await;
    let a = engine
        .create_account("alice", "A", Currency::Eur, 1_000)
        .await
        .unwrap();
    let b = engine
        .create_account("alice", "B", Currency::Eur, 1_000)
        .await
        .unwrap();

    let record = engine
        .create_transaction(
            "alice",
            CreateTransactionCmd::expense(a.id, 300, day(2024, 6, 1)).with_category(category),
        )
        .await
        .unwrap();
    assert_eq!(balance(&engine, a.id).await, 700);

    let updated = engine
        .update_transaction(
            "alice",
            record.transaction.id,
            UpdateTransactionCmd::default()
                .set_account(b.id)
                .set_date(day(2024, 6, 2))
                .set_note(Some("rebooked".to_string())),
        )
        .await
        .unwrap();

    assert_eq!(balance(&engine, a.id).await, 1_000);
    assert_eq!(balance(&engine, b.id).await, 700);
    assert_eq!(updated.transaction.account_id, Some(b.id));
    assert_eq!(updated.transaction.date, day(2024, 6, 2));
    assert_eq!(updated.transaction.note.as_deref(), Some("rebooked"));
}
