//! Lifecycle hook ordering, mutation and short-circuiting.

use axum::http::StatusCode;
use crudbase::{
    ApiError, Fields, HookFlow, MapConfig, ResourceController, ResourceHooks, async_trait, respond,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

mod common;
use common::memory_store::{Book, MemoryStore};
use common::{body_of, book_rules};

// ============================================================================
// HOOK TRACKING
// ============================================================================

/// Records every hook call and optionally short-circuits or rewrites data.
#[derive(Clone, Default)]
struct RecordingHooks {
    calls: Arc<Mutex<Vec<&'static str>>>,
    block_store: bool,
    block_update: bool,
    block_delete: bool,
}

impl RecordingHooks {
    fn record(&self, hook: &'static str) {
        self.calls.lock().unwrap().push(hook);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn blocked(message: &str) -> Result<HookFlow, ApiError> {
        Ok(HookFlow::Respond(respond(403, json!({"reason": "policy"}), message)?))
    }
}

#[async_trait]
impl ResourceHooks<Book> for RecordingHooks {
    async fn before_show(&self, book: &mut Book) -> Result<(), ApiError> {
        self.record("before_show");
        book.title = book.title.to_uppercase();
        Ok(())
    }

    async fn before_index(&self, books: &mut Vec<Book>) -> Result<(), ApiError> {
        self.record("before_index");
        books.retain(|book| book.id % 2 == 1);
        Ok(())
    }

    async fn before_store(&self, fields: &mut Fields) -> Result<HookFlow, ApiError> {
        self.record("before_store");
        if self.block_store {
            return Self::blocked("Creation disabled");
        }
        fields.insert("author".to_string(), json!("Set by hook"));
        Ok(HookFlow::Continue)
    }

    async fn after_store(&self, _book: &Book) -> Result<(), ApiError> {
        self.record("after_store");
        Ok(())
    }

    async fn before_update(&self, _book: &mut Book) -> Result<HookFlow, ApiError> {
        self.record("before_update");
        if self.block_update {
            return Self::blocked("Updates disabled");
        }
        Ok(HookFlow::Continue)
    }

    async fn after_update(&self, book: &Book) -> Result<(), ApiError> {
        self.record("after_update");
        assert_eq!(book.title, "Updated", "after_update sees the persisted entity");
        Ok(())
    }

    async fn before_delete(&self, _book: &mut Book) -> Result<HookFlow, ApiError> {
        self.record("before_delete");
        if self.block_delete {
            return Self::blocked("Deletion disabled");
        }
        Ok(HookFlow::Continue)
    }

    async fn after_delete(&self, _book: &Book) -> Result<(), ApiError> {
        self.record("after_delete");
        Ok(())
    }
}

fn controller(
    store: &MemoryStore,
    hooks: &RecordingHooks,
) -> ResourceController<MemoryStore, RecordingHooks> {
    ResourceController::new(store.clone(), book_rules())
        .with_hooks(hooks.clone())
        .with_config(MapConfig::new())
}

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}

// ============================================================================
// TESTS
// ============================================================================

#[tokio::test]
async fn test_before_show_mutation_is_visible() {
    let store = MemoryStore::with_books(1);
    let hooks = RecordingHooks::default();

    let body = body_of(controller(&store, &hooks).show(1).await.unwrap());
    assert_eq!(body["data"]["title"], "BOOK 1");
    assert_eq!(hooks.calls(), ["before_show"]);
    // the stored entity is untouched
    assert_eq!(store.get(1).unwrap().title, "Book 1");
}

#[tokio::test]
async fn test_before_show_not_called_when_missing() {
    let store = MemoryStore::new();
    let hooks = RecordingHooks::default();

    let response = controller(&store, &hooks).show(1).await.unwrap();
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(hooks.calls().is_empty());
}

#[tokio::test]
async fn test_before_index_filters_list() {
    let store = MemoryStore::with_books(4);
    let hooks = RecordingHooks::default();

    let body = body_of(controller(&store, &hooks).index(1, "/books").await.unwrap());
    let ids: Vec<u64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, [1, 3]);
    // pagination is computed from the fetched page, before the hook ran
    assert_eq!(body["pagination"]["to"], 4);
    assert_eq!(hooks.calls(), ["before_index"]);
}

#[tokio::test]
async fn test_store_hook_order_and_field_mutation() {
    let store = MemoryStore::new();
    let hooks = RecordingHooks::default();

    let response = controller(&store, &hooks)
        .store(fields(json!({"title": "Dune", "pages": 412})))
        .await
        .unwrap();
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(hooks.calls(), ["before_store", "after_store"]);
    assert_eq!(store.get(1).unwrap().author.as_deref(), Some("Set by hook"));
}

#[tokio::test]
async fn test_store_hooks_skipped_on_validation_failure() {
    let store = MemoryStore::new();
    let hooks = RecordingHooks::default();

    let response = controller(&store, &hooks)
        .store(fields(json!({"pages": 412})))
        .await
        .unwrap();
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(hooks.calls().is_empty());
}

#[tokio::test]
async fn test_before_store_short_circuits() {
    let store = MemoryStore::new();
    let hooks = RecordingHooks {
        block_store: true,
        ..RecordingHooks::default()
    };

    let response = controller(&store, &hooks)
        .store(fields(json!({"title": "Dune", "pages": 412})))
        .await
        .unwrap();
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_of(response),
        json!({"status": "Forbidden", "message": "Creation disabled", "reason": "policy"})
    );
    assert_eq!(hooks.calls(), ["before_store"]);
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_update_hook_order() {
    let store = MemoryStore::with_books(1);
    let hooks = RecordingHooks::default();

    let response = controller(&store, &hooks)
        .update(1, fields(json!({"title": "Updated"})))
        .await
        .unwrap();
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(hooks.calls(), ["before_update", "after_update"]);
}

#[tokio::test]
async fn test_before_update_short_circuits() {
    let store = MemoryStore::with_books(1);
    let hooks = RecordingHooks {
        block_update: true,
        ..RecordingHooks::default()
    };

    let response = controller(&store, &hooks)
        .update(1, fields(json!({"title": "Updated"})))
        .await
        .unwrap();
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(response.message(), "Updates disabled");
    assert_eq!(hooks.calls(), ["before_update"]);
    assert_eq!(store.get(1).unwrap().title, "Book 1");
}

#[tokio::test]
async fn test_delete_hook_order() {
    let store = MemoryStore::with_books(1);
    let hooks = RecordingHooks::default();

    let controller = controller(&store, &hooks);
    let response = controller.delete(1).await.unwrap();
    assert_eq!(response.status_code(), StatusCode::OK);
    // the controller's hooks share the recording with `hooks`
    assert_eq!(controller.hooks().calls(), ["before_delete", "after_delete"]);
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_before_delete_short_circuits() {
    let store = MemoryStore::with_books(1);
    let hooks = RecordingHooks {
        block_delete: true,
        ..RecordingHooks::default()
    };

    let response = controller(&store, &hooks).delete(1).await.unwrap();
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(hooks.calls(), ["before_delete"]);
    assert!(store.get(1).is_some());
}

/// A hook error aborts the action and propagates to the caller.
struct FailingHooks;

#[async_trait]
impl ResourceHooks<Book> for FailingHooks {
    async fn after_store(&self, _book: &Book) -> Result<(), ApiError> {
        Err(ApiError::internal("Notification failed", Some("smtp down".to_string())))
    }
}

#[tokio::test]
async fn test_hook_error_propagates() {
    let store = MemoryStore::new();
    let controller = ResourceController::new(store.clone(), book_rules()).with_hooks(FailingHooks);

    let err = controller
        .store(fields(json!({"title": "Dune", "pages": 412})))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.user_message(), "Notification failed");
    // the entity was created before after_store ran
    assert_eq!(store.len(), 1);
}
