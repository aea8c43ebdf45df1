//! Schema descriptors
//!
//! A `SchemaDescriptor` is the declarative metadata of one entity table. The
//! same descriptor drives input validation, the record accessor's column
//! allow-list, and DDL generation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::record::Record;
use crate::sql::sanitize::validate_identifier;
use crate::types::FieldSpec;

/// Column names of the store-populated timestamps
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// How rows of a table are keyed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TableKind {
    /// Single auto-generated key
    Standard,
    /// Many-to-many association keyed by the pair of fields
    Join { left: String, right: String },
}

/// Declarative metadata for one entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaDescriptor {
    /// Source entity name, e.g. `User`
    pub entity: String,
    /// Database table name
    #[serde(rename = "tableName")]
    pub table_name: String,
    /// Fields in declaration order
    pub fields: Vec<FieldSpec>,
    pub kind: TableKind,
}

impl SchemaDescriptor {
    /// Create a standard (auto-keyed) descriptor
    pub fn new(
        entity: impl Into<String>,
        table_name: impl Into<String>,
        fields: Vec<FieldSpec>,
    ) -> Self {
        Self {
            entity: entity.into(),
            table_name: table_name.into(),
            fields,
            kind: TableKind::Standard,
        }
    }

    /// Create a join descriptor keyed by the `left`/`right` pair
    pub fn join(
        entity: impl Into<String>,
        table_name: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
        fields: Vec<FieldSpec>,
    ) -> Self {
        Self {
            entity: entity.into(),
            table_name: table_name.into(),
            fields,
            kind: TableKind::Join {
                left: left.into(),
                right: right.into(),
            },
        }
    }

    /// Append the `created_at` / `updated_at` timestamps
    pub fn with_timestamps(mut self) -> Self {
        self.fields.push(FieldSpec::timestamp(CREATED_AT));
        self.fields.push(FieldSpec::timestamp(UPDATED_AT));
        self
    }

    /// Check the descriptor's structural invariants
    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.table_name, &[]).map_err(StoreError::invalid_schema)?;

        for (i, field) in self.fields.iter().enumerate() {
            validate_identifier(&field.name, &[]).map_err(StoreError::invalid_schema)?;
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(StoreError::invalid_schema(format!(
                    "{}: field '{}' is declared twice",
                    self.table_name, field.name
                )));
            }
        }

        let keys = self.fields.iter().filter(|f| f.auto_key).count();
        match &self.kind {
            TableKind::Standard if keys != 1 => Err(StoreError::invalid_schema(format!(
                "{}: expected exactly one auto-generated key, found {}",
                self.table_name, keys
            ))),
            TableKind::Join { .. } if keys != 0 => Err(StoreError::invalid_schema(format!(
                "{}: join tables cannot declare an auto-generated key",
                self.table_name
            ))),
            TableKind::Join { left, right } => {
                for name in [left, right] {
                    if self.field(name).is_none() {
                        return Err(StoreError::invalid_schema(format!(
                            "{}: join field '{}' is not declared",
                            self.table_name, name
                        )));
                    }
                }
                Ok(())
            }
            TableKind::Standard => Ok(()),
        }
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// The auto-generated key field, `None` for join tables
    pub fn key_field(&self) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.auto_key)
    }

    /// Column used when no explicit ordering is requested
    pub fn default_order_field(&self) -> &str {
        match (&self.kind, self.key_field()) {
            (_, Some(key)) => &key.name,
            (TableKind::Join { left, .. }, None) => left,
            (TableKind::Standard, None) => self
                .fields
                .first()
                .map(|f| f.name.as_str())
                .unwrap_or("id"),
        }
    }

    /// The composite key pair of a join table
    pub fn join_fields(&self) -> Option<(&str, &str)> {
        match &self.kind {
            TableKind::Join { left, right } => Some((left, right)),
            TableKind::Standard => None,
        }
    }

    pub fn is_join(&self) -> bool {
        matches!(self.kind, TableKind::Join { .. })
    }

    /// Fields callers may supply
    pub fn input_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.accepts_input())
    }

    /// Fields with a single-field uniqueness rule
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.unique && !f.auto_key)
    }

    /// Column allow-list used for ordering and criteria
    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Normalize a record decoded from the store to the descriptor's kinds
    ///
    /// Columns the descriptor does not declare (joined aliases) pass through.
    pub fn decode_record(&self, record: Record) -> Record {
        record
            .into_iter()
            .map(|(name, value)| match self.field(&name) {
                Some(field) => {
                    let value = field.kind.decode(value);
                    (name, value)
                }
                None => (name, value),
            })
            .collect()
    }
}
