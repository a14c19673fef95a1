use crudbase::{ApiError, EntityStore, Fields, Page, async_trait};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub pages: u32,
}

#[derive(Default)]
struct Inner {
    books: Mutex<BTreeMap<u64, Book>>,
    next_id: AtomicU64,
    refuse_create: AtomicBool,
    refuse_update: AtomicBool,
}

/// Thread-safe in-memory store. Clones share the same data, so a test can
/// keep a handle after moving one into a controller.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `count` books titled "Book 1", "Book 2", ...
    pub fn with_books(count: u64) -> Self {
        let store = Self::new();
        for n in 1..=count {
            store.insert(Book {
                id: 0,
                title: format!("Book {n}"),
                author: None,
                pages: 100,
            });
        }
        store
    }

    pub fn insert(&self, mut book: Book) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        book.id = id;
        self.inner.books.lock().unwrap().insert(id, book);
        id
    }

    pub fn get(&self, id: u64) -> Option<Book> {
        self.inner.books.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.books.lock().unwrap().len()
    }

    /// Make `create` report that nothing was created.
    pub fn refuse_create(&self) {
        self.inner.refuse_create.store(true, Ordering::SeqCst);
    }

    /// Make `update` report that nothing was written.
    pub fn refuse_update(&self) {
        self.inner.refuse_update.store(true, Ordering::SeqCst);
    }
}

fn invalid_fields(err: serde_json::Error) -> ApiError {
    ApiError::bad_request(format!("Invalid book fields: {err}"))
}

#[async_trait]
impl EntityStore for MemoryStore {
    type Entity = Book;
    type Id = u64;

    fn resource_name(&self) -> &str {
        "book"
    }

    fn id_of(&self, entity: &Book) -> Result<u64, ApiError> {
        Ok(entity.id)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Book>, ApiError> {
        Ok(self.get(id))
    }

    async fn paginate(&self, page: u64, per_page: u64) -> Result<Page<Book>, ApiError> {
        let books = self.inner.books.lock().unwrap();
        let skip = page
            .saturating_sub(1)
            .checked_mul(per_page)
            .and_then(|offset| usize::try_from(offset).ok())
            .unwrap_or(usize::MAX);
        let take = usize::try_from(per_page).unwrap_or(usize::MAX);
        let items = books.values().skip(skip).take(take).cloned().collect();
        Ok(Page::new(items, books.len() as u64))
    }

    async fn create(&self, fields: &Fields) -> Result<Option<Book>, ApiError> {
        if self.inner.refuse_create.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let book: Book =
            serde_json::from_value(Value::Object(fields.clone())).map_err(invalid_fields)?;
        let id = self.insert(book);
        Ok(self.get(id))
    }

    async fn update(&self, entity: &mut Book, fields: &Fields) -> Result<bool, ApiError> {
        if self.inner.refuse_update.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let mut merged = serde_json::to_value(&*entity).map_err(invalid_fields)?;
        if let Value::Object(map) = &mut merged {
            for (key, value) in fields {
                if key != "id" && map.contains_key(key) {
                    map.insert(key.clone(), value.clone());
                }
            }
        }
        let updated: Book = serde_json::from_value(merged).map_err(invalid_fields)?;
        self.inner
            .books
            .lock()
            .unwrap()
            .insert(updated.id, updated.clone());
        *entity = updated;
        Ok(true)
    }

    async fn delete(&self, entity: &Book) -> Result<(), ApiError> {
        self.inner.books.lock().unwrap().remove(&entity.id);
        Ok(())
    }
}
