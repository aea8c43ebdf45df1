//! Core type definitions for schema descriptors
//!
//! Includes field kinds, default values, and field specifications.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Width used for short-text columns that declare no maximum length
pub const DEFAULT_SHORT_TEXT_LENGTH: u32 = 255;

/// Sentinel default rendered as a function call rather than a string literal
pub const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

// ============================================================================
// Field Kinds
// ============================================================================

/// Field kind with validation rules and SQL mapping
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Bounded text (maps to VARCHAR(n))
    ShortText,

    /// Unbounded text (maps to TEXT)
    LongText,

    /// Integer (maps to INT)
    Integer,

    /// Boolean (maps to BOOLEAN)
    Boolean,

    /// Timestamp (maps to TIMESTAMP)
    Timestamp,
}

impl FieldKind {
    /// Convert the field kind to a MySQL type string
    pub fn to_sql_type(&self, max_length: Option<u32>) -> String {
        match self {
            FieldKind::ShortText => format!(
                "VARCHAR({})",
                max_length.unwrap_or(DEFAULT_SHORT_TEXT_LENGTH)
            ),
            FieldKind::LongText => "TEXT".to_string(),
            FieldKind::Integer => "INT".to_string(),
            FieldKind::Boolean => "BOOLEAN".to_string(),
            FieldKind::Timestamp => "TIMESTAMP".to_string(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FieldKind::ShortText | FieldKind::LongText)
    }

    /// Validate that a JSON value is compatible with this field kind
    ///
    /// Returns the human-readable expectation on mismatch, e.g. `"an integer"`.
    pub fn validate_value(&self, value: &Value) -> Result<(), &'static str> {
        // Null is handled by the required flag, not the kind
        if value.is_null() {
            return Ok(());
        }

        match (self, value) {
            (FieldKind::ShortText | FieldKind::LongText, Value::String(_)) => Ok(()),
            (FieldKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(()),
            // Route parameters arrive as strings
            (FieldKind::Integer, Value::String(s)) if s.trim().parse::<i64>().is_ok() => Ok(()),
            (FieldKind::Boolean, Value::Bool(_)) => Ok(()),
            (FieldKind::Boolean, Value::Number(n)) if matches!(n.as_i64(), Some(0 | 1)) => Ok(()),
            (FieldKind::Boolean, Value::String(s)) if parse_bool(s).is_some() => Ok(()),
            (FieldKind::Timestamp, Value::String(s)) if parse_timestamp(s).is_some() => Ok(()),
            _ => Err(self.expectation()),
        }
    }

    /// Coerce an already validated input value to its stored representation
    pub fn coerce(&self, value: &Value) -> Value {
        match (self, value) {
            (FieldKind::ShortText | FieldKind::LongText, Value::String(s)) => {
                Value::String(s.trim().to_string())
            }
            (FieldKind::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or(Value::Null),
            (FieldKind::Boolean, Value::String(s)) => {
                parse_bool(s).map(Value::Bool).unwrap_or(Value::Null)
            }
            (FieldKind::Boolean, Value::Number(n)) => Value::Bool(n.as_i64() == Some(1)),
            (FieldKind::Timestamp, Value::String(s)) => parse_timestamp(s)
                .map(|ts| Value::String(ts.format("%Y-%m-%d %H:%M:%S").to_string()))
                .unwrap_or(Value::Null),
            _ => value.clone(),
        }
    }

    /// Convert a value decoded from the store into its JSON representation
    ///
    /// MySQL reports BOOLEAN columns as TINYINT, so they decode as 0/1.
    pub fn decode(&self, value: Value) -> Value {
        match (self, &value) {
            (FieldKind::Boolean, Value::Number(n)) => Value::Bool(n.as_i64().unwrap_or(0) != 0),
            _ => value,
        }
    }

    fn expectation(&self) -> &'static str {
        match self {
            FieldKind::ShortText | FieldKind::LongText => "a string",
            FieldKind::Integer => "an integer",
            FieldKind::Boolean => "a boolean",
            FieldKind::Timestamp => "a timestamp",
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Accepts RFC 3339 and the MySQL `YYYY-MM-DD HH:MM:SS` form, normalized to UTC
fn parse_timestamp(s: &str) -> Option<chrono::NaiveDateTime> {
    let s = s.trim();
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok())
}

// ============================================================================
// Defaults and Formats
// ============================================================================

/// Column default value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    /// String literal, rendered single-quoted
    Text(String),
    /// `CURRENT_TIMESTAMP`, rendered unquoted
    CurrentTimestamp,
    /// Rendered verbatim (numbers, TRUE/FALSE)
    Raw(String),
}

impl DefaultValue {
    /// Interpret a literal the way schema files spell it: the
    /// `CURRENT_TIMESTAMP` sentinel becomes a function call, anything else a string
    pub fn from_literal(value: impl Into<String>) -> Self {
        let value = value.into();
        if value == CURRENT_TIMESTAMP {
            DefaultValue::CurrentTimestamp
        } else {
            DefaultValue::Text(value)
        }
    }

    pub fn to_sql(&self) -> String {
        match self {
            DefaultValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            DefaultValue::CurrentTimestamp => CURRENT_TIMESTAMP.to_string(),
            DefaultValue::Raw(s) => s.clone(),
        }
    }
}

/// Format checks applied on top of the field kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldFormat {
    /// `local@domain.tld`
    Email,
}

// ============================================================================
// Field Specifications
// ============================================================================

/// Field specification within a schema descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    /// Column name (must be a valid identifier)
    pub name: String,

    pub kind: FieldKind,

    /// Must be present on creation (default: false)
    #[serde(default)]
    pub required: bool,

    /// Carries a UNIQUE constraint and a pre-insert lookup (default: false)
    #[serde(default)]
    pub unique: bool,

    /// Maximum length for short-text fields
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,

    /// Auto-generated integer primary key
    #[serde(rename = "autoKey", default)]
    pub auto_key: bool,

    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<FieldFormat>,

    /// Stored and compared lower-cased
    #[serde(default)]
    pub lowercase: bool,

    /// Populated by the store, never accepted from input
    #[serde(default)]
    pub managed: bool,
}

impl FieldSpec {
    /// Create a new optional field with a name and kind
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            unique: false,
            max_length: None,
            auto_key: false,
            default_value: None,
            format: None,
            lowercase: false,
            managed: false,
        }
    }

    /// Auto-generated integer key field
    pub fn key(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer).auto_key()
    }

    /// Bounded text field
    pub fn short_text(name: impl Into<String>, max_length: u32) -> Self {
        Self::new(name, FieldKind::ShortText).max_length(max_length)
    }

    /// Store-populated timestamp defaulting to `CURRENT_TIMESTAMP`
    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Timestamp)
            .default(DefaultValue::CurrentTimestamp)
            .managed()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn auto_key(mut self) -> Self {
        self.auto_key = true;
        self
    }

    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn email(mut self) -> Self {
        self.format = Some(FieldFormat::Email);
        self
    }

    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    pub fn managed(mut self) -> Self {
        self.managed = true;
        self
    }

    /// The key is implicitly required
    pub fn is_required(&self) -> bool {
        self.required || self.auto_key
    }

    /// Whether callers may supply this field
    pub fn accepts_input(&self) -> bool {
        !self.auto_key && !self.managed
    }
}
