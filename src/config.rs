//! Configuration lookup.
//!
//! Controllers read their settings through [`ConfigSource`] on every call, so a
//! source backed by live state (environment, a reloadable file) is picked up
//! without rebuilding the router.

use serde_json::Value;
use std::collections::HashMap;

/// Key holding the number of entities per page for `index`.
pub const PAGE_SIZE_KEY: &str = "database.page_size";

/// Page size used when [`PAGE_SIZE_KEY`] is unset or invalid.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// A key/value configuration provider. Keys are dotted paths such as
/// `database.page_size`.
pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
}

/// The configured page size, falling back to [`DEFAULT_PAGE_SIZE`] when the
/// key is missing or not a positive integer.
#[must_use]
pub fn page_size(config: &dyn ConfigSource) -> u64 {
    let Some(value) = config.get(PAGE_SIZE_KEY) else {
        return DEFAULT_PAGE_SIZE;
    };

    let parsed = match &value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };

    match parsed {
        Some(size) if size > 0 => size,
        _ => {
            tracing::warn!(
                key = PAGE_SIZE_KEY,
                value = %value,
                default = DEFAULT_PAGE_SIZE,
                "Invalid page size, using default"
            );
            DEFAULT_PAGE_SIZE
        }
    }
}

/// Reads configuration from environment variables.
///
/// `database.page_size` is looked up as `DATABASE_PAGE_SIZE` (or
/// `{PREFIX}_DATABASE_PAGE_SIZE` with [`EnvConfig::with_prefix`]). Values that
/// parse as JSON (`25`, `true`, `[1,2]`) are returned as such, anything else as
/// a string.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    prefix: Option<String>,
}

impl EnvConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a `.env` file from the current directory or its parents first, if
    /// one exists. Variables already set in the environment take precedence.
    #[must_use]
    pub fn from_dotenv() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!(error = %err, "Failed to load .env file"),
        }
        Self::new()
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Environment variable name for a dotted key.
    #[must_use]
    pub fn variable_name(&self, key: &str) -> String {
        let name: String = key
            .chars()
            .map(|c| match c {
                '.' | '-' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();
        match &self.prefix {
            Some(prefix) => format!("{}_{name}", prefix.to_ascii_uppercase()),
            None => name,
        }
    }
}

impl ConfigSource for EnvConfig {
    fn get(&self, key: &str) -> Option<Value> {
        let raw = std::env::var(self.variable_name(key)).ok()?;
        Some(parse_value(&raw))
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Fixed in-memory configuration.
///
/// ```rust,ignore
/// let config = MapConfig::new().with("database.page_size", 25);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    values: HashMap<String, Value>,
}

impl MapConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for MapConfig {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MapConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
