use axum::{
    Router,
    extract::{OriginalUri, Path, Query, State, rejection::PathRejection},
    routing::get,
};
use std::sync::Arc;

use crate::controller::ResourceController;
use crate::errors::ApiError;
use crate::extract::RequestFields;
use crate::hooks::ResourceHooks;
use crate::models::PageQuery;
use crate::response::ApiResponse;
use crate::traits::EntityStore;
use crate::validation::Validator;

type Shared<S, H, V> = State<Arc<ResourceController<S, H, V>>>;

/// Router exposing the controller's actions:
///
/// | Method | Path | Action |
/// |---|---|---|
/// | `GET` | `/` | `index` |
/// | `POST` | `/` | `store` |
/// | `GET` | `/{id}` | `show` |
/// | `PUT`, `PATCH` | `/{id}` | `update` |
/// | `DELETE` | `/{id}` | `delete` |
///
/// Nest it under the resource's path, e.g. `Router::new().nest("/books", resource_router(books))`.
/// An `{id}` that does not parse as the store's id type answers 404.
pub fn resource_router<S, H, V>(controller: ResourceController<S, H, V>) -> Router
where
    S: EntityStore + 'static,
    H: ResourceHooks<S::Entity> + 'static,
    V: Validator + 'static,
{
    Router::new()
        .route("/", get(index::<S, H, V>).post(store::<S, H, V>))
        .route(
            "/{id}",
            get(show::<S, H, V>)
                .put(update::<S, H, V>)
                .patch(update::<S, H, V>)
                .delete(delete::<S, H, V>),
        )
        .with_state(Arc::new(controller))
}

fn parse_id<T>(id: Result<Path<T>, PathRejection>) -> Option<T> {
    match id {
        Ok(Path(id)) => Some(id),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Unparseable resource id");
            None
        }
    }
}

pub async fn index<S, H, V>(
    State(controller): Shared<S, H, V>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<ApiResponse, ApiError>
where
    S: EntityStore,
    H: ResourceHooks<S::Entity>,
    V: Validator,
{
    controller.index(query.page(), uri.path()).await
}

pub async fn show<S, H, V>(
    State(controller): Shared<S, H, V>,
    id: Result<Path<S::Id>, PathRejection>,
) -> Result<ApiResponse, ApiError>
where
    S: EntityStore,
    H: ResourceHooks<S::Entity>,
    V: Validator,
{
    match parse_id(id) {
        Some(id) => controller.show(id).await,
        None => ApiResponse::status(404),
    }
}

pub async fn store<S, H, V>(
    State(controller): Shared<S, H, V>,
    RequestFields(fields): RequestFields,
) -> Result<ApiResponse, ApiError>
where
    S: EntityStore,
    H: ResourceHooks<S::Entity>,
    V: Validator,
{
    controller.store(fields).await
}

pub async fn update<S, H, V>(
    State(controller): Shared<S, H, V>,
    id: Result<Path<S::Id>, PathRejection>,
    RequestFields(fields): RequestFields,
) -> Result<ApiResponse, ApiError>
where
    S: EntityStore,
    H: ResourceHooks<S::Entity>,
    V: Validator,
{
    match parse_id(id) {
        Some(id) => controller.update(id, fields).await,
        None => ApiResponse::status(404),
    }
}

pub async fn delete<S, H, V>(
    State(controller): Shared<S, H, V>,
    id: Result<Path<S::Id>, PathRejection>,
) -> Result<ApiResponse, ApiError>
where
    S: EntityStore,
    H: ResourceHooks<S::Entity>,
    V: Validator,
{
    match parse_id(id) {
        Some(id) => controller.delete(id).await,
        None => ApiResponse::status(404),
    }
}
