use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{accounts, categories, history, transactions, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/accounts", post(accounts::create).get(accounts::list))
        .route(
            "/accounts/{id}",
            get(accounts::get)
                .patch(accounts::rename)
                .delete(accounts::remove),
        )
        .route("/accounts/recompute", post(accounts::recompute))
        .route(
            "/categories",
            post(categories::create).get(categories::list),
        )
        .route(
            "/categories/{id}",
            axum::routing::patch(categories::rename).delete(categories::remove),
        )
        .route(
            "/transactions",
            post(transactions::create).get(transactions::list),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .patch(transactions::update)
                .delete(transactions::remove),
        )
        .route("/history", get(history::get))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ConnectionTrait, Database, Statement};
    use tower::ServiceExt;

    use super::*;

    // "alice:password"
    const AUTH: &str = "Basic YWxpY2U6cGFzc3dvcmQ=";

    async fn test_state() -> ServerState {
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
        ServerState {
            engine: Arc::new(engine),
            db,
        }
    }

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, AUTH);
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn requests_need_valid_credentials() {
        let state = test_state().await;

        let response = router(state.clone())
            .oneshot(Request::builder().uri("/accounts").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_client_error());

        // "alice:wrong"
        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/accounts")
                    .header(header::AUTHORIZATION, "Basic YWxpY2U6d3Jvbmc=")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn account_create_and_get() {
        let state = test_state().await;

        let response = router(state.clone())
            .oneshot(request(
                "POST",
                "/accounts",
                Some(serde_json::json!({
                    "name": "Cash",
                    "currency": "EUR",
                    "initial_balance": 1_000,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let id = created["id"].as_str().unwrap().to_string();

        let response = router(state)
            .oneshot(request("GET", &format!("/accounts/{id}"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let account = body_json(response).await;
        assert_eq!(account["name"], "Cash");
        assert_eq!(account["total_balance"], 1_000);
    }

    #[tokio::test]
    async fn duplicate_account_conflicts() {
        let state = test_state().await;
        let payload = serde_json::json!({ "name": "Cash" });

        let response = router(state.clone())
            .oneshot(request("POST", "/accounts", Some(payload.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router(state)
            .oneshot(request("POST", "/accounts", Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let state = test_state().await;
        let id = uuid::Uuid::new_v4();

        let response = router(state)
            .oneshot(request("GET", &format!("/accounts/{id}"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transaction_create_updates_balance_and_history() {
        let state = test_state().await;
        let account = state
            .engine
            .create_account("alice", "Cash", engine::Currency::Eur, 0)
            .await
            .unwrap();
        let category = state
            .engine
            .create_category("alice", "Salary", None, None)
            .await
            .unwrap();

        let response = router(state.clone())
            .oneshot(request(
                "POST",
                "/transactions",
                Some(serde_json::json!({
                    "kind": "income",
                    "amount": 500,
                    "account_id": account.id,
                    "category_id": category.id,
                    "date": "2024-01-05",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router(state.clone())
            .oneshot(request("GET", &format!("/accounts/{}", account.id), None))
            .await
            .unwrap();
        let view = body_json(response).await;
        assert_eq!(view["total_balance"], 500);

        let response = router(state)
            .oneshot(request(
                "GET",
                &format!(
                    "/history?account_id={}&start=2024-01-05&end=2024-01-05",
                    account.id
                ),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let history = body_json(response).await;
        assert_eq!(history["days"][0]["balance"], 500);
        assert_eq!(history["days"][0]["income"], 500);
    }

    #[tokio::test]
    async fn list_filters_by_kind_over_the_query_string() {
        let state = test_state().await;
        let a = state
            .engine
            .create_account("alice", "A", engine::Currency::Eur, 0)
            .await
            .unwrap();
        let b = state
            .engine
            .create_account("alice", "B", engine::Currency::Eur, 0)
            .await
            .unwrap();
        let category = state
            .engine
            .create_category("alice", "Misc", None, None)
            .await
            .unwrap();

        for payload in [
            serde_json::json!({
                "kind": "income",
                "amount": 100,
                "account_id": a.id,
                "category_id": category.id,
                "date": "2024-01-01",
            }),
            serde_json::json!({
                "kind": "expense",
                "amount": 40,
                "account_id": a.id,
                "category_id": category.id,
                "date": "2024-01-02",
            }),
            serde_json::json!({
                "kind": "transfer",
                "amount": 10,
                "from_account_id": a.id,
                "to_account_id": b.id,
                "date": "2024-01-03",
            }),
        ] {
            let response = router(state.clone())
                .oneshot(request("POST", "/transactions", Some(payload)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = router(state.clone())
            .oneshot(request("GET", "/transactions?kinds=income", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["transactions"].as_array().unwrap().len(), 1);
        assert_eq!(body["transactions"][0]["kind"], "income");

        let response = router(state.clone())
            .oneshot(request("GET", "/transactions?kinds=income,transfer", None))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["transactions"].as_array().unwrap().len(), 2);

        // A kind outside the enum never reaches the engine.
        let response = router(state)
            .oneshot(request("GET", "/transactions?kinds=refund", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_transaction_is_unprocessable() {
        let state = test_state().await;
        let account = state
            .engine
            .create_account("alice", "Cash", engine::Currency::Eur, 0)
            .await
            .unwrap();

        // Income without a category never reaches the database.
        let response = router(state)
            .oneshot(request(
                "POST",
                "/transactions",
                Some(serde_json::json!({
                    "kind": "income",
                    "amount": 500,
                    "account_id": account.id,
                    "date": "2024-01-05",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
