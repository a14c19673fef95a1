//! # Resource Controller
//!
//! [`ResourceController`] implements the five standard actions (`show`,
//! `index`, `store`, `update`, `delete`) once, for any [`EntityStore`]. Each
//! action validates input, runs the lifecycle hooks around the store call and
//! answers with the `{status, message, ...}` envelope.
//!
//! ```rust,ignore
//! let rules = RuleSets::new(
//!     RuleSet::from([("title", "required|string|max:255"), ("author", "nullable|string")]),
//!     RuleSet::from([("title", "filled|string|max:255")]),
//! );
//! let books = ResourceController::new(SeaOrmStore::<book::ActiveModel>::new(db), rules)
//!     .with_hooks(BookHooks)
//!     .with_config(EnvConfig::from_dotenv());
//!
//! let app = Router::new().nest("/books", resource_router(books));
//! ```

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::Fields;
use crate::config::{self, ConfigSource, EnvConfig};
use crate::errors::ApiError;
use crate::hooks::{HookFlow, NoHooks, ResourceHooks};
use crate::pagination::{Page, PaginationMeta};
use crate::response::{ApiResponse, respond};
use crate::rules::RuleSets;
use crate::traits::EntityStore;
use crate::validation::{RuleValidator, Validation, Validator};

/// Message sent with a 400 response when validation fails.
pub const INVALID_PARAMETERS: &str = "Invalid parameters";

/// Generic CRUD controller over one entity store.
///
/// `H` customizes the actions through lifecycle hooks and `V` validates
/// submitted fields; both default to the built-in implementations.
pub struct ResourceController<S, H = NoHooks, V = RuleValidator> {
    store: S,
    hooks: H,
    validator: V,
    rules: RuleSets,
    config: Arc<dyn ConfigSource>,
}

impl<S: EntityStore> ResourceController<S> {
    /// Controller with no hooks, the rule validator and environment configuration.
    pub fn new(store: S, rules: RuleSets) -> Self {
        Self {
            store,
            hooks: NoHooks,
            validator: RuleValidator,
            rules,
            config: Arc::new(EnvConfig::new()),
        }
    }
}

impl<S, H, V> ResourceController<S, H, V> {
    pub fn with_hooks<H2>(self, hooks: H2) -> ResourceController<S, H2, V> {
        ResourceController {
            store: self.store,
            hooks,
            validator: self.validator,
            rules: self.rules,
            config: self.config,
        }
    }

    pub fn with_validator<V2>(self, validator: V2) -> ResourceController<S, H, V2> {
        ResourceController {
            store: self.store,
            hooks: self.hooks,
            validator,
            rules: self.rules,
            config: self.config,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: impl ConfigSource + 'static) -> Self {
        self.config = Arc::new(config);
        self
    }

    #[must_use]
    pub fn with_shared_config(mut self, config: Arc<dyn ConfigSource>) -> Self {
        self.config = config;
        self
    }

    pub fn entity_store(&self) -> &S {
        &self.store
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn rules(&self) -> &RuleSets {
        &self.rules
    }
}

impl<S, H, V> ResourceController<S, H, V>
where
    S: EntityStore,
    H: ResourceHooks<S::Entity>,
    V: Validator,
{
    /// Show one entity: 200 `{data}`, or 404.
    ///
    /// # Errors
    /// Store and hook errors.
    pub async fn show(&self, id: S::Id) -> Result<ApiResponse, ApiError> {
        tracing::debug!(resource = %self.store.resource_name(), id = ?id, "show");

        let Some(mut entity) = self.store.find_by_id(id).await? else {
            return ApiResponse::status(404);
        };

        self.hooks.before_show(&mut entity).await?;

        respond(200, payload([("data", serde_json::to_value(&entity)?)]), "")
    }

    /// List page `page` of the entities: 200 `{data, pagination}`.
    ///
    /// `path` is the request path the pagination links are built from.
    /// `pagination` is `null` when the page is empty.
    ///
    /// # Errors
    /// Store and hook errors.
    pub async fn index(&self, page: u64, path: &str) -> Result<ApiResponse, ApiError> {
        let page = page.max(1);
        let per_page = config::page_size(self.config.as_ref());
        tracing::debug!(resource = %self.store.resource_name(), page, per_page, "index");

        let Page { mut items, total } = self.store.paginate(page, per_page).await?;
        let pagination = if items.is_empty() {
            None
        } else {
            Some(PaginationMeta::new(page, per_page, total, items.len(), path))
        };

        self.hooks.before_index(&mut items).await?;

        respond(
            200,
            payload([
                ("data", serde_json::to_value(&items)?),
                ("pagination", serde_json::to_value(&pagination)?),
            ]),
            "",
        )
    }

    /// Create an entity from `fields`: 201 `{id}`, 400 `{fails}` or 500.
    ///
    /// # Errors
    /// Store and hook errors.
    pub async fn store(&self, mut fields: Fields) -> Result<ApiResponse, ApiError> {
        tracing::debug!(resource = %self.store.resource_name(), "store");

        let validation = self.validator.validate(&fields, self.rules.create());
        if validation.failed() {
            return self.invalid(validation);
        }

        if let HookFlow::Respond(response) = self.hooks.before_store(&mut fields).await? {
            return Ok(response);
        }

        let Some(entity) = self.store.create(&fields).await? else {
            tracing::warn!(resource = %self.store.resource_name(), "Store did not create the entity");
            return ApiResponse::status(500);
        };

        self.hooks.after_store(&entity).await?;

        let id = self.store.id_of(&entity)?;
        respond(201, payload([("id", serde_json::to_value(&id)?)]), "")
    }

    /// Apply `fields` to an existing entity: 200, 404, 400 `{fails}` or 500.
    ///
    /// # Errors
    /// Store and hook errors.
    pub async fn update(&self, id: S::Id, fields: Fields) -> Result<ApiResponse, ApiError> {
        tracing::debug!(resource = %self.store.resource_name(), id = ?id, "update");

        let Some(mut entity) = self.store.find_by_id(id).await? else {
            return ApiResponse::status(404);
        };

        let validation = self.validator.validate(&fields, self.rules.update());
        if validation.failed() {
            return self.invalid(validation);
        }

        if let HookFlow::Respond(response) = self.hooks.before_update(&mut entity).await? {
            return Ok(response);
        }

        if !self.store.update(&mut entity, &fields).await? {
            tracing::warn!(resource = %self.store.resource_name(), "Store did not update the entity");
            return ApiResponse::status(500);
        }

        self.hooks.after_update(&entity).await?;

        ApiResponse::status(200)
    }

    /// Delete an entity: 200 or 404.
    ///
    /// # Errors
    /// Store and hook errors.
    pub async fn delete(&self, id: S::Id) -> Result<ApiResponse, ApiError> {
        tracing::debug!(resource = %self.store.resource_name(), id = ?id, "delete");

        let Some(mut entity) = self.store.find_by_id(id).await? else {
            return ApiResponse::status(404);
        };

        if let HookFlow::Respond(response) = self.hooks.before_delete(&mut entity).await? {
            return Ok(response);
        }

        self.store.delete(&entity).await?;

        self.hooks.after_delete(&entity).await?;

        ApiResponse::status(200)
    }

    fn invalid(&self, validation: Validation) -> Result<ApiResponse, ApiError> {
        tracing::warn!(
            resource = %self.store.resource_name(),
            fails = ?validation.errors(),
            "Validation failed"
        );
        respond(
            400,
            payload([("fails", Value::from(validation.into_errors()))]),
            INVALID_PARAMETERS,
        )
    }
}

fn payload<const N: usize>(entries: [(&str, Value); N]) -> Value {
    let map: Map<String, Value> = entries
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect();
    Value::Object(map)
}
