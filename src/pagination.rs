use serde::Serialize;

/// One page of entities as returned by a store, plus the total row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<E> {
    pub items: Vec<E>,
    pub total: u64,
}

impl<E> Page<E> {
    #[must_use]
    pub fn new(items: Vec<E>, total: u64) -> Self {
        Self { items, total }
    }
}

/// Pagination metadata sent next to the page's `data`.
///
/// URLs are built from `path` (the request path without its query string)
/// and a `page` parameter. `from` and `to` are 1-based positions of the
/// first and last item on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub current_page: u64,
    pub first_page_url: String,
    pub from: Option<u64>,
    pub last_page: u64,
    pub last_page_url: String,
    pub next_page_url: Option<String>,
    pub path: String,
    pub per_page: u64,
    pub prev_page_url: Option<String>,
    pub to: Option<u64>,
    pub total: u64,
}

impl PaginationMeta {
    /// Metadata for page `page` (treated as 1 when below 1) holding
    /// `item_count` of `total` items.
    #[must_use]
    pub fn new(page: u64, per_page: u64, total: u64, item_count: usize, path: &str) -> Self {
        let current_page = page.max(1);
        let per_page = per_page.max(1);
        let last_page = total.div_ceil(per_page).max(1);

        let (from, to) = if item_count == 0 {
            (None, None)
        } else {
            let first = (current_page - 1).saturating_mul(per_page).saturating_add(1);
            (Some(first), Some(first.saturating_add(item_count as u64 - 1)))
        };

        Self {
            current_page,
            first_page_url: page_url(path, 1),
            from,
            last_page,
            last_page_url: page_url(path, last_page),
            next_page_url: (current_page < last_page).then(|| page_url(path, current_page + 1)),
            path: path.to_owned(),
            per_page,
            prev_page_url: (current_page > 1).then(|| page_url(path, current_page - 1)),
            to,
            total,
        }
    }
}

fn page_url(path: &str, page: u64) -> String {
    format!("{path}?page={page}")
}
