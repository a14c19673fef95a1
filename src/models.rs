use serde::Deserialize;

/// Query parameters understood by `index`.
///
/// `page` is read leniently: a missing, non-numeric or zero value means the
/// first page.
#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    #[must_use]
    pub fn page(&self) -> u64 {
        self.page
            .as_deref()
            .and_then(|page| page.trim().parse::<u64>().ok())
            .unwrap_or(1)
            .max(1)
    }
}
