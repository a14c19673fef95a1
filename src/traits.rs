use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

use crate::Fields;
use crate::errors::ApiError;
use crate::pagination::Page;

/// Persistence for one entity type.
///
/// The controller never touches the database directly; it looks entities up,
/// pages through them and applies submitted fields through this trait.
/// [`SeaOrmStore`](crate::store::SeaOrmStore) implements it for any Sea-ORM
/// entity whose model is serde-serializable.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// The persisted entity, serialized as the `data` of `show` and `index`.
    type Entity: Serialize + Send + Sync;

    /// Primary key, parsed from the `/{id}` path segment and echoed back by
    /// `store`.
    type Id: Serialize + DeserializeOwned + Debug + Clone + Send + Sync + 'static;

    /// Singular resource name used in log events.
    fn resource_name(&self) -> &str;

    /// Primary key of `entity`.
    fn id_of(&self, entity: &Self::Entity) -> Result<Self::Id, ApiError>;

    async fn find_by_id(&self, id: Self::Id) -> Result<Option<Self::Entity>, ApiError>;

    /// Page `page` (1-based) of `per_page` entities, in primary-key order.
    async fn paginate(&self, page: u64, per_page: u64) -> Result<Page<Self::Entity>, ApiError>;

    /// Persist a new entity built from `fields`. `Ok(None)` means the store
    /// refused to create it.
    async fn create(&self, fields: &Fields) -> Result<Option<Self::Entity>, ApiError>;

    /// Apply `fields` to `entity` and persist it. On success `entity` holds the
    /// stored state; `Ok(false)` means nothing was written.
    async fn update(&self, entity: &mut Self::Entity, fields: &Fields) -> Result<bool, ApiError>;

    async fn delete(&self, entity: &Self::Entity) -> Result<(), ApiError>;
}
