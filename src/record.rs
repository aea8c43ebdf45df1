//! Record-related types
//!
//! Includes Record, Criteria, ListOptions, and composed read shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An untyped row: field name to scalar value
pub type Record = serde_json::Map<String, Value>;

/// Integer key produced by the store's auto-increment column
pub type Key = i64;

/// Read the integer key of a record
pub fn record_key(record: &Record, key_field: &str) -> Option<Key> {
    match record.get(key_field)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Conjunctive equality criteria, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pairs: Vec<(String, Value)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field = value` condition; a repeated field replaces the earlier value
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(f, _)| *f == field) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((field, value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pairs.iter().map(|(f, v)| (f.as_str(), v))
    }
}

impl From<Record> for Criteria {
    fn from(record: Record) -> Self {
        Self {
            pairs: record.into_iter().collect(),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Options for listing records
///
/// Without a limit the listing is unrestricted; an offset without a limit is
/// ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListOptions {
    /// Maximum number of rows (must be > 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Number of rows to skip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Column to order by (default: the table key)
    #[serde(rename = "orderBy", skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default)]
    pub direction: SortDirection,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set pagination
    pub fn paginate(self, offset: u64, limit: u64) -> Self {
        self.offset(offset).limit(limit)
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn descending(mut self) -> Self {
        self.direction = SortDirection::Desc;
        self
    }
}

/// A panel together with the character variants linked to it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelWithCharacters {
    #[serde(flatten)]
    pub panel: Record,
    /// Linked variants, each carrying `character_name`
    pub characters: Vec<Record>,
}
