//! # Lifecycle Hooks
//!
//! [`ResourceHooks`] lets a resource customize the generic controller without
//! reimplementing its actions. Every hook has a no-op default, so an
//! implementation only overrides what it needs.
//!
//! | Hook | Runs | Can short-circuit |
//! |---|---|---|
//! | `before_show` | after the lookup, before responding | no |
//! | `before_index` | after the page is fetched | no |
//! | `before_store` | after validation, before creation | yes |
//! | `after_store` | after creation | no |
//! | `before_update` | after lookup and validation, before persisting | yes |
//! | `after_update` | after persisting | no |
//! | `before_delete` | after the lookup, before deletion | yes |
//! | `after_delete` | after deletion | no |
//!
//! A hook that can short-circuit returns [`HookFlow::Respond`] to end the
//! action with its own response. Returning `Err` aborts the action with that
//! error, like any store failure.
//!
//! ```rust,ignore
//! pub struct BookHooks;
//!
//! #[async_trait]
//! impl ResourceHooks<book::Model> for BookHooks {
//!     async fn before_store(&self, fields: &mut Fields) -> Result<HookFlow, ApiError> {
//!         fields.entry("title").and_modify(|title| *title = json!(title.as_str().unwrap_or_default().trim()));
//!         Ok(HookFlow::Continue)
//!     }
//!
//!     async fn before_delete(&self, book: &mut book::Model) -> Result<HookFlow, ApiError> {
//!         if book.locked {
//!             return Ok(HookFlow::Respond(respond(403, json!({}), "Book is locked")?));
//!         }
//!         Ok(HookFlow::Continue)
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::Fields;
use crate::errors::ApiError;
use crate::response::ApiResponse;

/// Whether an action continues after a `before_*` hook.
#[derive(Debug, Clone, PartialEq)]
pub enum HookFlow {
    Continue,
    /// Stop the action and send this response instead.
    Respond(ApiResponse),
}

/// Customization points of the resource controller for entity type `E`.
#[async_trait]
pub trait ResourceHooks<E: Send + Sync>: Send + Sync {
    /// Called with the entity about to be shown; changes are visible in the response.
    async fn before_show(&self, _entity: &mut E) -> Result<(), ApiError> {
        Ok(())
    }

    /// Called with the page of entities about to be listed.
    async fn before_index(&self, _entities: &mut Vec<E>) -> Result<(), ApiError> {
        Ok(())
    }

    /// Called with the validated fields; changes are what gets persisted.
    async fn before_store(&self, _fields: &mut Fields) -> Result<HookFlow, ApiError> {
        Ok(HookFlow::Continue)
    }

    async fn after_store(&self, _entity: &E) -> Result<(), ApiError> {
        Ok(())
    }

    /// Called with the stored entity before the submitted fields are applied.
    async fn before_update(&self, _entity: &mut E) -> Result<HookFlow, ApiError> {
        Ok(HookFlow::Continue)
    }

    async fn after_update(&self, _entity: &E) -> Result<(), ApiError> {
        Ok(())
    }

    async fn before_delete(&self, _entity: &mut E) -> Result<HookFlow, ApiError> {
        Ok(HookFlow::Continue)
    }

    async fn after_delete(&self, _entity: &E) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

#[async_trait]
impl<E: Send + Sync> ResourceHooks<E> for NoHooks {}
