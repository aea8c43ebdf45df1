//! Persisted store seam
//!
//! The accessor and the migration runner speak SQL text plus positional
//! parameters through the [`Database`] trait. [`MySqlDatabase`] implements it
//! over a `sqlx` MySQL pool.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, Row};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::record::Record;

/// Result of a write statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    /// Key generated by an auto-increment column, if any
    pub last_insert_id: Option<u64>,
}

/// A store that executes parameterized statements
#[async_trait]
pub trait Database: Send + Sync {
    /// Run a query and decode every returned row
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>>;

    /// Run a write statement
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome>;
}

/// [`Database`] backed by a MySQL connection pool
#[derive(Debug, Clone)]
pub struct MySqlDatabase {
    pool: MySqlPool,
}

impl MySqlDatabase {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Open a pool sized by `config.max_connections`
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .map_err(|e| StoreError::Connection(format!("Database connection failed: {}", e)))?;

        tracing::info!(max_connections = config.max_connections, "connected to MySQL");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    fn bind_param<'q>(
        query: Query<'q, MySql, MySqlArguments>,
        value: &'q Value,
    ) -> Query<'q, MySql, MySqlArguments> {
        match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    query.bind(i)
                } else if let Some(u) = n.as_u64() {
                    query.bind(u)
                } else {
                    query.bind(n.as_f64())
                }
            }
            Value::String(s) => query.bind(s.as_str()),
            other => query.bind(other.to_string()),
        }
    }
}

#[async_trait]
impl Database for MySqlDatabase {
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        let mut query = sqlx::query(sql);
        for p in params {
            query = Self::bind_param(query, p);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome> {
        tracing::debug!(sql = %sql, params = ?params, "execute");
        let mut query = sqlx::query(sql);
        for p in params {
            query = Self::bind_param(query, p);
        }
        let result = query.execute(&self.pool).await?;
        Ok(ExecOutcome {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_id()).filter(|id| *id != 0),
        })
    }
}

fn row_to_record(row: &MySqlRow) -> Record {
    let mut record = Record::new();
    for col in row.columns() {
        let name = col.name();
        record.insert(name.to_string(), cell_to_value(row, name));
    }
    record
}

fn cell_to_value(row: &MySqlRow, name: &str) -> Value {
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::from(n);
    }
    if let Ok(Some(n)) = row.try_get::<Option<u64>, _>(name) {
        return Value::from(n);
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(f)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::Null
}
