//! DDL Generation from schema descriptors
//!
//! Generates MySQL `CREATE TABLE IF NOT EXISTS` statements for entity tables.

use crate::error::Result;
use crate::schema::{SchemaDescriptor, UPDATED_AT};
use crate::sql::sanitize::quote_identifier;
use crate::types::{FieldKind, FieldSpec};

/// Suffix marking a field as a reference to another table's key
pub const FOREIGN_KEY_SUFFIX: &str = "_id";

/// DDL Generator for entity tables
pub struct DdlGenerator<'a> {
    schema: &'a SchemaDescriptor,
}

impl<'a> DdlGenerator<'a> {
    /// Create a new DDL generator for the given descriptor
    pub fn new(schema: &'a SchemaDescriptor) -> Self {
        Self { schema }
    }

    /// Generate the CREATE TABLE statement
    ///
    /// Column order:
    /// - The auto-generated key, first
    /// - Remaining fields in declaration order
    /// - Composite primary key (join tables)
    /// - One secondary index per unique or `_id` field
    pub fn generate_create_table(&self) -> Result<String> {
        self.schema.validate()?;

        let mut definitions = Vec::new();

        if let Some(key) = self.schema.key_field() {
            definitions.push(format!(
                "{} INT AUTO_INCREMENT PRIMARY KEY",
                quote_identifier(&key.name)
            ));
        }

        for field in self.schema.fields.iter().filter(|f| !f.auto_key) {
            definitions.push(Self::format_column_definition(field));
        }

        if let Some((left, right)) = self.schema.join_fields() {
            definitions.push(format!(
                "PRIMARY KEY ({}, {})",
                quote_identifier(left),
                quote_identifier(right)
            ));
        }

        definitions.extend(self.index_definitions());

        let body = definitions
            .iter()
            .map(|d| format!("  {}", d))
            .collect::<Vec<_>>()
            .join(",\n");

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
            quote_identifier(&self.schema.table_name),
            body
        ))
    }

    /// Secondary index declarations for unique and foreign-key fields
    ///
    /// The two fields of a join table's composite key are covered by the
    /// primary key and get no index of their own.
    pub fn index_definitions(&self) -> Vec<String> {
        let pair = self.schema.join_fields();

        self.schema
            .fields
            .iter()
            .filter(|f| !f.auto_key)
            .filter(|f| f.unique || f.name.ends_with(FOREIGN_KEY_SUFFIX))
            .filter(|f| !matches!(pair, Some((l, r)) if f.name == l || f.name == r))
            .map(|f| {
                format!(
                    "INDEX {} ({})",
                    quote_identifier(&format!("idx_{}", f.name)),
                    quote_identifier(&f.name)
                )
            })
            .collect()
    }

    /// Format a single non-key column definition
    pub fn format_column_definition(field: &FieldSpec) -> String {
        let mut parts = vec![
            quote_identifier(&field.name),
            field.kind.to_sql_type(field.max_length),
        ];

        if field.required {
            parts.push("NOT NULL".to_string());
        }

        if field.unique {
            parts.push("UNIQUE".to_string());
        }

        if let Some(default) = &field.default_value {
            parts.push(format!("DEFAULT {}", default.to_sql()));
        }

        if field.kind == FieldKind::Timestamp && field.name == UPDATED_AT {
            parts.push("ON UPDATE CURRENT_TIMESTAMP".to_string());
        }

        parts.join(" ")
    }
}
