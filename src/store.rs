//! [`EntityStore`] backed by Sea-ORM.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ColumnType, DatabaseConnection, DbErr,
    EntityName, EntityTrait, IdenStatic, IntoActiveModel, Iterable, PaginatorTrait,
    PrimaryKeyToColumn, PrimaryKeyTrait, QueryOrder, TryIntoModel,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt::Debug;
use std::marker::PhantomData;

use crate::Fields;
use crate::errors::ApiError;
use crate::pagination::Page;
use crate::traits::EntityStore;

type EntityOf<A> = <A as ActiveModelTrait>::Entity;
type ModelOf<A> = <EntityOf<A> as EntityTrait>::Model;
type KeyOf<A> = <<EntityOf<A> as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

/// Store for the entity behind the active model `A`.
///
/// Fields are mapped onto the model by name through serde, so the model's
/// serialized field names must match its column names (the Sea-ORM default).
/// String values aimed at integer, float and boolean columns are converted
/// first, so query-string and form input binds like JSON input.
/// Single-column primary keys only.
///
/// ```rust,ignore
/// let store = SeaOrmStore::<book::ActiveModel>::new(db.clone());
/// ```
pub struct SeaOrmStore<A> {
    db: DatabaseConnection,
    resource: String,
    _active_model: PhantomData<fn() -> A>,
}

impl<A: ActiveModelTrait> SeaOrmStore<A> {
    /// Store named after the entity's table.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let resource = <EntityOf<A> as Default>::default().table_name().to_owned();
        Self {
            db,
            resource,
            _active_model: PhantomData,
        }
    }

    #[must_use]
    pub fn with_resource_name(mut self, name: impl Into<String>) -> Self {
        self.resource = name.into();
        self
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// `fields` with string values converted to the type of their column.
    fn typed_fields(fields: &Fields) -> Fields {
        let mut typed = fields.clone();
        for column in <<EntityOf<A> as EntityTrait>::Column as Iterable>::iter() {
            let Some(slot) = typed.get_mut(column.as_str()) else {
                continue;
            };
            if let Value::String(text) = &*slot {
                if let Some(value) = from_text(column.def().get_column_type(), text) {
                    *slot = value;
                }
            }
        }
        typed
    }

    fn primary_key_column() -> Option<String> {
        <<EntityOf<A> as EntityTrait>::PrimaryKey as Iterable>::iter()
            .next()
            .map(|key| key.into_column().as_str().to_owned())
    }
}

impl<A> Clone for SeaOrmStore<A> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            resource: self.resource.clone(),
            _active_model: PhantomData,
        }
    }
}

/// Parses `text` as a value of `column_type`. `None` leaves the string as it
/// is; a blank string for a numeric or boolean column becomes `null`.
fn from_text(column_type: &ColumnType, text: &str) -> Option<Value> {
    let text = text.trim();
    match column_type {
        ColumnType::TinyInteger
        | ColumnType::SmallInteger
        | ColumnType::Integer
        | ColumnType::BigInteger
        | ColumnType::TinyUnsigned
        | ColumnType::SmallUnsigned
        | ColumnType::Unsigned
        | ColumnType::BigUnsigned => {
            if text.is_empty() {
                return Some(Value::Null);
            }
            text.parse::<i64>()
                .map(Value::from)
                .or_else(|_| text.parse::<u64>().map(Value::from))
                .ok()
        }
        ColumnType::Float | ColumnType::Double => {
            if text.is_empty() {
                return Some(Value::Null);
            }
            text.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
        }
        ColumnType::Boolean => match text {
            "" => Some(Value::Null),
            "1" | "true" => Some(Value::Bool(true)),
            "0" | "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

/// `from_json` reports type mismatches in the submitted fields as `DbErr::Json`.
fn map_fields_error(resource: &str, err: DbErr) -> ApiError {
    match err {
        DbErr::Json(details) => {
            tracing::debug!(resource = %resource, details = %details, "Fields do not fit the model");
            ApiError::bad_request(format!("Submitted fields do not match the {resource} resource"))
        }
        other => ApiError::database(other),
    }
}

#[async_trait]
impl<A> EntityStore for SeaOrmStore<A>
where
    A: ActiveModelTrait + ActiveModelBehavior + TryIntoModel<ModelOf<A>> + Send + Sync + 'static,
    ModelOf<A>: IntoActiveModel<A> + Serialize + DeserializeOwned + Sync,
    KeyOf<A>: Serialize + DeserializeOwned + Debug + Clone + Send + Sync + 'static,
{
    type Entity = ModelOf<A>;
    type Id = KeyOf<A>;

    fn resource_name(&self) -> &str {
        &self.resource
    }

    fn id_of(&self, entity: &Self::Entity) -> Result<Self::Id, ApiError> {
        let column = Self::primary_key_column()
            .ok_or_else(|| ApiError::internal("Entity has no primary key", None))?;

        let mut value = serde_json::to_value(entity)?;
        let id = value.get_mut(&column).map(Value::take).ok_or_else(|| {
            ApiError::internal(
                "Failed to read primary key",
                Some(format!("serialized {} has no `{column}` field", self.resource)),
            )
        })?;
        Ok(serde_json::from_value(id)?)
    }

    async fn find_by_id(&self, id: Self::Id) -> Result<Option<Self::Entity>, ApiError> {
        <EntityOf<A> as EntityTrait>::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(ApiError::database)
    }

    async fn paginate(&self, page: u64, per_page: u64) -> Result<Page<Self::Entity>, ApiError> {
        let mut select = <EntityOf<A> as EntityTrait>::find();
        for key in <<EntityOf<A> as EntityTrait>::PrimaryKey as Iterable>::iter() {
            select = select.order_by_asc(key.into_column());
        }

        let per_page = per_page.max(1);
        let paginator = select.paginate(&self.db, per_page);
        let total = paginator.num_items().await.map_err(ApiError::database)?;

        // The paginator computes the offset unchecked.
        let index = page.saturating_sub(1);
        match index.checked_mul(per_page) {
            Some(offset) if offset < total => {}
            _ => return Ok(Page::new(Vec::new(), total)),
        }

        let items = paginator
            .fetch_page(index)
            .await
            .map_err(ApiError::database)?;
        Ok(Page::new(items, total))
    }

    async fn create(&self, fields: &Fields) -> Result<Option<Self::Entity>, ApiError> {
        let active = A::from_json(Value::Object(Self::typed_fields(fields)))
            .map_err(|err| map_fields_error(&self.resource, err))?;
        let model = active.insert(&self.db).await.map_err(ApiError::database)?;
        Ok(Some(model))
    }

    async fn update(&self, entity: &mut Self::Entity, fields: &Fields) -> Result<bool, ApiError> {
        // Overlay known fields onto the current state; unknown keys are dropped.
        let Value::Object(mut merged) = serde_json::to_value(&*entity)? else {
            return Ok(false);
        };
        for (key, value) in Self::typed_fields(fields) {
            if let Some(slot) = merged.get_mut(&key) {
                *slot = value;
            }
        }

        let mut active: A = entity.clone().into_active_model();
        active
            .set_from_json(Value::Object(merged))
            .map_err(|err| map_fields_error(&self.resource, err))?;

        match active.update(&self.db).await {
            Ok(updated) => {
                *entity = updated;
                Ok(true)
            }
            Err(DbErr::RecordNotUpdated) => {
                tracing::warn!(resource = %self.resource, "Update matched no rows");
                Ok(false)
            }
            Err(err) => Err(ApiError::database(err)),
        }
    }

    async fn delete(&self, entity: &Self::Entity) -> Result<(), ApiError> {
        let active: A = entity.clone().into_active_model();
        let result = active.delete(&self.db).await.map_err(ApiError::database)?;
        if result.rows_affected == 0 {
            return Err(ApiError::not_found(self.resource.clone(), None));
        }
        Ok(())
    }
}
