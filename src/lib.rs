//! # crudbase
//!
//! A generic resource controller for Axum and Sea-ORM. One
//! [`ResourceController`] serves `show`, `index`, `store`, `update` and
//! `delete` for any [`EntityStore`], answering every request with the same
//! JSON envelope:
//!
//! ```json
//! {"status": "Created", "message": "", "id": 42}
//! ```
//!
//! Resources plug in validation rules ([`RuleSets`]) and lifecycle hooks
//! ([`ResourceHooks`]); [`resource_router`] mounts the actions on an Axum router.

pub mod config;
pub mod controller;
pub mod errors;
pub mod extract;
pub mod hooks;
pub mod models;
pub mod pagination;
pub mod response;
pub mod routes;
pub mod rules;
pub mod status;
pub mod store;
pub mod traits;
pub mod validation;

/// Submitted field map of a request.
pub type Fields = serde_json::Map<String, serde_json::Value>;

pub use config::{ConfigSource, EnvConfig, MapConfig};
pub use controller::ResourceController;
pub use errors::ApiError;
pub use extract::RequestFields;
pub use hooks::{HookFlow, NoHooks, ResourceHooks};
pub use pagination::{Page, PaginationMeta};
pub use response::{ApiResponse, respond};
pub use routes::resource_router;
pub use rules::{RuleSet, RuleSets};
pub use store::SeaOrmStore;
pub use traits::EntityStore;
pub use validation::{RuleValidator, Validation, Validator};

// Re-export async_trait so hook and store implementations don't need the dependency
pub use async_trait::async_trait;
