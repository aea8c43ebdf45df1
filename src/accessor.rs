//! Generic record accessor
//!
//! Table-agnostic CRUD parameterized by a [`SchemaDescriptor`]. Every entity
//! service holds one. The accessor does not validate values; it only checks
//! identifiers against the descriptor and binds everything else.

use std::sync::Arc;

use serde_json::Value;

use crate::db::Database;
use crate::error::{Result, StoreError};
use crate::record::{Criteria, Key, ListOptions, Record};
use crate::schema::SchemaDescriptor;
use crate::sql::query::{self, QueryBuf};

/// CRUD operations over one table
#[derive(Clone)]
pub struct RecordAccessor {
    db: Arc<dyn Database>,
    schema: SchemaDescriptor,
}

impl RecordAccessor {
    pub fn new(db: Arc<dyn Database>, schema: SchemaDescriptor) -> Self {
        Self { db, schema }
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn table_name(&self) -> &str {
        &self.schema.table_name
    }

    /// The shared store handle
    pub fn database(&self) -> &Arc<dyn Database> {
        &self.db
    }

    /// Run a read and decode the rows against this table's descriptor
    ///
    /// For entity-specific queries the generic builders do not cover.
    pub async fn fetch(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        let rows = self.db.fetch_all(sql, params).await?;
        Ok(rows
            .into_iter()
            .map(|row| self.schema.decode_record(row))
            .collect())
    }

    async fn fetch_query(&self, q: QueryBuf) -> Result<Vec<Record>> {
        self.fetch(&q.sql, &q.params).await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// List records with ordering and optional limit/offset
    pub async fn list_all(&self, options: &ListOptions) -> Result<Vec<Record>> {
        self.fetch_query(query::select_all(&self.schema, options)?)
            .await
    }

    /// Get a record by key, `None` when absent
    pub async fn get_by_key(&self, key: Key) -> Result<Option<Record>> {
        let rows = self
            .fetch_query(query::select_by_key(&self.schema, key)?)
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Records matching every criterion; empty criteria lists everything
    pub async fn find_where(&self, criteria: &Criteria) -> Result<Vec<Record>> {
        if criteria.is_empty() {
            return self.list_all(&ListOptions::default()).await;
        }
        self.fetch_query(query::select_where(&self.schema, criteria)?)
            .await
    }

    pub async fn find_one_where(&self, criteria: &Criteria) -> Result<Option<Record>> {
        let rows = self
            .fetch_query(query::select_one_where(&self.schema, criteria)?)
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn count(&self, criteria: &Criteria) -> Result<u64> {
        let rows = self
            .fetch_query(query::count(&self.schema, criteria)?)
            .await?;
        let total = rows
            .first()
            .and_then(|row| row.get("total"))
            .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(0);
        Ok(total)
    }

    pub async fn exists(&self, key: Key) -> Result<bool> {
        Ok(self.get_by_key(key).await?.is_some())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert exactly the supplied fields and return the stored record
    ///
    /// Standard tables re-read by the generated key; join tables by the
    /// inserted pair.
    pub async fn insert(&self, data: Record) -> Result<Record> {
        let q = query::insert(&self.schema, &data)?;
        let outcome = self.db.execute(&q.sql, &q.params).await?;

        let created = match self.schema.join_fields() {
            Some((left, right)) => {
                let criteria = Criteria::new()
                    .eq(left, data.get(left).cloned().unwrap_or(Value::Null))
                    .eq(right, data.get(right).cloned().unwrap_or(Value::Null));
                self.find_one_where(&criteria).await?
            }
            None => {
                let key = outcome.last_insert_id.ok_or_else(|| {
                    StoreError::database(format!(
                        "insert into '{}' returned no generated key",
                        self.schema.table_name
                    ))
                })?;
                self.get_by_key(key as Key).await?
            }
        };

        created.ok_or_else(|| {
            StoreError::database(format!(
                "inserted row in '{}' could not be read back",
                self.schema.table_name
            ))
        })
    }

    /// Overwrite only the supplied fields
    ///
    /// Empty data returns the current record without writing. `None` when the
    /// key is absent.
    pub async fn update(&self, key: Key, data: Record) -> Result<Option<Record>> {
        if data.is_empty() {
            return self.get_by_key(key).await;
        }
        let q = query::update(&self.schema, key, &data)?;
        self.db.execute(&q.sql, &q.params).await?;
        self.get_by_key(key).await
    }

    /// Delete by key, `true` if a row was removed
    pub async fn delete_by_key(&self, key: Key) -> Result<bool> {
        let q = query::delete_by_key(&self.schema, key)?;
        let outcome = self.db.execute(&q.sql, &q.params).await?;
        Ok(outcome.rows_affected > 0)
    }

    /// Delete every row matching the criteria; empty criteria is rejected
    pub async fn delete_where(&self, criteria: &Criteria) -> Result<bool> {
        let q = query::delete_where(&self.schema, criteria)?;
        let outcome = self.db.execute(&q.sql, &q.params).await?;
        Ok(outcome.rows_affected > 0)
    }
}
