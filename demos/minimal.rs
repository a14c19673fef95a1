//! Minimal books API on SQLite
//!
//! ```bash
//! cargo run --example minimal
//! ```
//!
//! Then try:
//! - `curl localhost:3000/books`
//! - `curl -X POST localhost:3000/books -H 'content-type: application/json' -d '{"title":"Dune","pages":412}'`
//!
//! `DATABASE_URL` and `DATABASE_PAGE_SIZE` are read from the environment or a `.env` file.

use crudbase::{
    ApiError, EnvConfig, Fields, HookFlow, ResourceController, ResourceHooks, RuleSet, RuleSets,
    SeaOrmStore, async_trait, resource_router, respond,
};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema, entity::prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::env;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(default)]
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub pages: i32,
    #[serde(default)]
    pub locked: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}
impl ActiveModelBehavior for ActiveModel {}

struct BookHooks;

#[async_trait]
impl ResourceHooks<Model> for BookHooks {
    async fn before_store(&self, fields: &mut Fields) -> Result<HookFlow, ApiError> {
        if let Some(title) = fields.get("title").and_then(|title| title.as_str()) {
            let trimmed = title.trim().to_string();
            fields.insert("title".to_string(), json!(trimmed));
        }
        Ok(HookFlow::Continue)
    }

    async fn after_store(&self, book: &Model) -> Result<(), ApiError> {
        tracing::info!(id = book.id, title = %book.title, "Book created");
        Ok(())
    }

    async fn before_delete(&self, book: &mut Model) -> Result<HookFlow, ApiError> {
        if book.locked {
            return Ok(HookFlow::Respond(respond(403, json!({}), "Book is locked")?));
        }
        Ok(HookFlow::Continue)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EnvConfig::from_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,crudbase=debug")),
        )
        .compact()
        .init();

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let db: DatabaseConnection = Database::connect(&database_url).await?;

    let backend = db.get_database_backend();
    let mut create_books = Schema::new(backend).create_table_from_entity(Entity);
    create_books.if_not_exists();
    db.execute(backend.build(&create_books)).await?;

    let rules = RuleSets::new(
        RuleSet::from([
            ("title", "required|string|max:255"),
            ("author", "nullable|string|max:255"),
            ("pages", "required|integer|min:1"),
            ("locked", "boolean"),
        ]),
        RuleSet::from([("title", "filled|string|max:255"), ("pages", "integer|min:1")]),
    );
    let books = ResourceController::new(SeaOrmStore::<ActiveModel>::new(db), rules)
        .with_hooks(BookHooks)
        .with_config(config);

    let app = axum::Router::new().nest("/books", resource_router(books));
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("API: http://0.0.0.0:3000/books");
    axum::serve(listener, app).await?;
    Ok(())
}
