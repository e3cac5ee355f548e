//! Datasource document: maps page paths to configuration identifiers
//!
//! ```yaml
//! datasource:
//!   urls:
//!     /products: config/products.yaml
//!     /checkout:
//!       - config/common.yaml
//!       - https://cdn.example.com/checkout.yaml
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

/// Default identifier of the datasource document
pub const DEFAULT_DATASOURCE: &str = "config/datasource.yaml";

/// Parsed datasource. Entries that are neither a string nor a sequence are
/// kept as empty lists; non-string list items are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSource {
    urls: BTreeMap<String, Vec<String>>,
}

impl DataSource {
    pub fn from_value(value: Value) -> Self {
        let urls = match value
            .get("datasource")
            .and_then(|section| section.get("urls"))
        {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(path, entry)| (path.clone(), identifiers(entry)))
                .collect(),
            _ => BTreeMap::new(),
        };
        Self { urls }
    }

    /// Identifiers registered for `path`, in document order. Unknown paths yield none.
    pub fn identifiers_for(&self, path: &str) -> Vec<String> {
        self.urls.get(path).cloned().unwrap_or_default()
    }

    /// Every registered path
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.urls.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl<'de> Deserialize<'de> for DataSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

fn identifiers(entry: &Value) -> Vec<String> {
    match entry {
        Value::String(identifier) => vec![identifier.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Path component of a location. Full URLs are reduced to their path; bare
/// paths lose any query or fragment.
pub fn location_path(location: &str) -> String {
    if let Ok(url) = Url::parse(location) {
        if url.has_host() {
            return url.path().to_string();
        }
    }
    location
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_string()
}
