//! Core domain types for skillseeker source configurations.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Default crawl delay in seconds when a config omits `rate_limit`.
pub const DEFAULT_RATE_LIMIT: f64 = 0.5;

/// Default crawl size when a config omits `max_pages`.
pub const DEFAULT_MAX_PAGES: u32 = 500;

// ---------------------------------------------------------------------------
// OrderedMap
// ---------------------------------------------------------------------------

/// A string-keyed map that keeps insertion order through serde round-trips.
///
/// Category and route tables are displayed and processed in declaration
/// order, so a sorted or hashed map would reorder user files on rewrite.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

// ---------------------------------------------------------------------------
// Selectors / UrlPatterns
// ---------------------------------------------------------------------------

/// CSS-like selectors consumed by the external crawler. Opaque here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selectors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_blocks: Option<String>,
    /// Any other named selectors, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// URL include/exclude patterns, in crawler evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlPatterns {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

// ---------------------------------------------------------------------------
// SourceConfig
// ---------------------------------------------------------------------------

/// One documentation source, stored as `configs/<name>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Identifier, `[A-Za-z0-9_-]+`.
    pub name: String,
    /// "When to use" hint; also feeds router descriptions.
    #[serde(default)]
    pub description: String,
    /// Absolute http(s) URL ending in `/`.
    pub base_url: String,
    #[serde(default)]
    pub selectors: Selectors,
    #[serde(default)]
    pub url_patterns: UrlPatterns,
    /// Category name → keyword list, in declaration order.
    #[serde(default)]
    pub categories: OrderedMap<Vec<String>>,
    /// Seconds between requests (enforced by the crawler, not here).
    #[serde(default = "default_rate_limit")]
    pub rate_limit: f64,
    /// Upper bound on crawl size.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Unknown fields, preserved so rewrites stay compatible with the crawler.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_rate_limit() -> f64 {
    DEFAULT_RATE_LIMIT
}

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

impl SourceConfig {
    /// Whether this document carries the router marker in its pass-through fields.
    ///
    /// Router files loaded as plain source configs keep `is_router` (or the
    /// legacy `_router`) in `extra`.
    pub fn is_router(&self) -> bool {
        ["is_router", "_router"]
            .iter()
            .any(|key| self.extra.get(*key).and_then(Value::as_bool).unwrap_or(false))
    }

    /// Category names in declaration order.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.keys().collect()
    }
}

// ---------------------------------------------------------------------------
// RouterConfig
// ---------------------------------------------------------------------------

/// A source config that dispatches queries to sub-skills instead of owning content.
///
/// `base_url` is only present for schema completeness. The crawler must skip
/// any document with `is_router = true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(flatten)]
    pub source: SourceConfig,
    #[serde(default, alias = "_router")]
    pub is_router: bool,
    /// Sub-skill name → one-line routing summary.
    #[serde(default)]
    pub routes: OrderedMap<String>,
}

impl RouterConfig {
    pub fn name(&self) -> &str {
        &self.source.name
    }
}
