#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use crudbase::{MapConfig, ResourceController, RuleSet, RuleSets, resource_router};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use serde_json::Value;
use tower::ServiceExt;

pub mod book_entity;
pub mod memory_store;

use memory_store::MemoryStore;

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;

    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    db.execute(backend.build(&schema.create_table_from_entity(book_entity::Entity)))
        .await?;

    Ok(db)
}

/// Rules used by the book resource in the tests.
pub fn book_rules() -> RuleSets {
    RuleSets::new(
        RuleSet::from([
            ("title", "required|string|max:100"),
            ("author", "nullable|string"),
            ("pages", "required|integer|min:1"),
        ]),
        RuleSet::from([("title", "filled|string|max:100"), ("pages", "integer|min:1")]),
    )
}

pub fn book_controller(store: MemoryStore) -> ResourceController<MemoryStore> {
    ResourceController::new(store, book_rules())
        .with_config(MapConfig::new().with("database.page_size", 3))
}

pub fn setup_test_app(store: MemoryStore) -> Router {
    Router::new().nest("/api/v1/books", resource_router(book_controller(store)))
}

/// Sends one request through `app` and returns the status and decoded body.
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Envelope body as a JSON value, for comparing whole responses.
pub fn body_of(response: crudbase::ApiResponse) -> Value {
    Value::Object(response.into_body())
}
