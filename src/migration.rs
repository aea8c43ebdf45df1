//! Migration artifacts and runner
//!
//! Artifacts are `<ordering>_<description>.sql` files holding a header comment
//! block and one DDL statement. The runner applies files in filename order
//! and records each applied filename in a bookkeeping table.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::accessor::RecordAccessor;
use crate::config::StoreConfig;
use crate::db::Database;
use crate::entities;
use crate::error::{Result, StoreError};
use crate::record::{ListOptions, Record};
use crate::schema::SchemaDescriptor;
use crate::sql::DdlGenerator;
use crate::types::FieldSpec;

const MIGRATION_EXTENSION: &str = "sql";

// ============================================================================
// Artifacts
// ============================================================================

/// A generated migration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationArtifact {
    pub filename: String,
    #[serde(rename = "tableName")]
    pub table_name: String,
    /// The bare DDL statement
    pub sql: String,
    /// Full file content, header included
    pub content: String,
}

/// Sortable prefix for migration filenames: `YYYYMMDDHHMMSS` plus a two-digit
/// sequence number
pub fn ordering_timestamp(now: DateTime<Utc>, sequence: u32) -> String {
    format!("{}{:02}", now.format("%Y%m%d%H%M%S"), sequence)
}

/// Build the artifact for one descriptor
///
/// `name` overrides the default `create_<table>_table` description.
pub fn generate_artifact(
    schema: &SchemaDescriptor,
    name: Option<&str>,
    ordering: &str,
    created: DateTime<Utc>,
) -> Result<MigrationArtifact> {
    let sql = DdlGenerator::new(schema).generate_create_table()?;
    let description = match name {
        Some(name) => {
            check_migration_name(name)?;
            name.to_string()
        }
        None => format!("create_{}_table", schema.table_name),
    };
    let title = match name {
        Some(name) => name.to_string(),
        None => format!("Create {} table", schema.table_name),
    };

    let content = format!(
        "-- Migration: {}\n-- Generated from: {} model\n-- Created: {}\n\n{}\n",
        title,
        schema.entity,
        created.to_rfc3339_opts(SecondsFormat::Millis, true),
        sql
    );

    Ok(MigrationArtifact {
        filename: format!("{}_{}.{}", ordering, description, MIGRATION_EXTENSION),
        table_name: schema.table_name.clone(),
        sql,
        content,
    })
}

/// Artifacts for every entity, in dependency order with increasing prefixes
pub fn generate_all(now: DateTime<Utc>) -> Result<Vec<MigrationArtifact>> {
    entities::all_schemas()
        .iter()
        .enumerate()
        .map(|(i, schema)| {
            let ordering = ordering_timestamp(now, i as u32 + 1);
            generate_artifact(schema, None, &ordering, now)
        })
        .collect()
}

/// Write an artifact into `dir`, creating the directory if needed
pub async fn write_artifact(dir: &Path, artifact: &MigrationArtifact) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(&artifact.filename);
    tokio::fs::write(&path, &artifact.content).await?;
    tracing::info!(file = %artifact.filename, table = %artifact.table_name, "generated migration");
    Ok(path)
}

/// Write an empty migration template named `<ordering>_<name>.sql`
pub async fn create_template(dir: &Path, name: &str, now: DateTime<Utc>) -> Result<PathBuf> {
    check_migration_name(name)?;
    let filename = format!(
        "{}_{}.{}",
        ordering_timestamp(now, 0),
        name,
        MIGRATION_EXTENSION
    );
    let content = format!(
        "-- Migration: {}\n-- Created: {}\n\n-- Write your migration SQL here\n",
        name,
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    );

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(&filename);
    tokio::fs::write(&path, content).await?;
    tracing::info!(file = %filename, "created migration");
    Ok(path)
}

fn check_migration_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StoreError::validation(vec![
            "Migration name is required".to_string(),
        ]));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StoreError::validation(vec![format!(
            "Migration name '{}' may only contain letters, digits, '_' and '-'",
            name
        )]));
    }
    Ok(())
}

/// Split a migration file into executable statements
///
/// Lines starting with `--` are dropped, then the text is split on `;`
/// outside single-quoted literals. A `''` escape toggles twice, so it stays
/// inside the literal.
pub fn split_statements(sql: &str) -> Vec<String> {
    let body: String = sql
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_literal = false;
    for c in body.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                current.push(c);
            }
            ';' if !in_literal => statements.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    statements.push(current);

    statements
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// ============================================================================
// Runner
// ============================================================================

/// Executed and pending migration filenames
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    pub executed: Vec<String>,
    pub pending: Vec<String>,
}

/// Descriptor of the bookkeeping table
pub fn bookkeeping_schema(table: &str) -> SchemaDescriptor {
    SchemaDescriptor::new(
        "Migration",
        table,
        vec![
            FieldSpec::key("id"),
            FieldSpec::short_text("name", 255).required().unique(),
            FieldSpec::timestamp("executed_at"),
        ],
    )
}

/// Applies migration files from a directory
pub struct MigrationRunner {
    db: Arc<dyn Database>,
    dir: PathBuf,
    applied: RecordAccessor,
}

impl MigrationRunner {
    pub fn new(db: Arc<dyn Database>, dir: impl Into<PathBuf>, table: &str) -> Self {
        Self {
            applied: RecordAccessor::new(db.clone(), bookkeeping_schema(table)),
            db,
            dir: dir.into(),
        }
    }

    pub fn from_config(db: Arc<dyn Database>, config: &StoreConfig) -> Self {
        Self::new(db, config.migrations_dir.clone(), &config.migrations_table)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the bookkeeping table if it does not exist
    pub async fn ensure_table(&self) -> Result<()> {
        let ddl = DdlGenerator::new(self.applied.schema()).generate_create_table()?;
        self.db.execute(&ddl, &[]).await?;
        Ok(())
    }

    /// Recorded filenames, sorted
    pub async fn executed(&self) -> Result<Vec<String>> {
        let rows = self
            .applied
            .list_all(&ListOptions::new().order_by("name"))
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    /// `*.sql` filenames in the directory, sorted; empty if it does not exist
    pub async fn files(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(MIGRATION_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push(name.to_string());
            }
        }
        files.sort();
        Ok(files)
    }

    pub async fn pending(&self) -> Result<Vec<String>> {
        let executed = self.executed().await?;
        Ok(self
            .files()
            .await?
            .into_iter()
            .filter(|f| !executed.contains(f))
            .collect())
    }

    pub async fn status(&self) -> Result<MigrationStatus> {
        self.ensure_table().await?;
        let executed = self.executed().await?;
        let pending = self
            .files()
            .await?
            .into_iter()
            .filter(|f| !executed.contains(f))
            .collect();
        Ok(MigrationStatus { executed, pending })
    }

    /// Apply every pending migration, returning the applied filenames
    ///
    /// Stops at the first failing statement; migrations applied before it stay
    /// recorded.
    pub async fn run(&self) -> Result<Vec<String>> {
        self.ensure_table().await?;
        let pending = self.pending().await?;
        if pending.is_empty() {
            tracing::info!("no pending migrations");
        }

        for filename in &pending {
            tracing::info!(file = %filename, "executing migration");
            let sql = tokio::fs::read_to_string(self.dir.join(filename)).await?;
            for statement in split_statements(&sql) {
                self.db.execute(&statement, &[]).await?;
            }

            let mut record = Record::new();
            record.insert("name".to_string(), Value::String(filename.clone()));
            self.applied.insert(record).await?;
            tracing::info!(file = %filename, "completed migration");
        }
        Ok(pending)
    }
}
