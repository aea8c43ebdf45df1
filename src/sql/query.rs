//! Statement builders for the record accessor
//!
//! Every builder returns SQL text with `?` placeholders plus the positional
//! parameters to bind. Identifiers come from the schema descriptor and are
//! checked against its column allow-list before they reach a statement.

use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::record::{Criteria, Key, ListOptions, Record};
use crate::schema::SchemaDescriptor;
use crate::sql::sanitize::quote_identifier;

/// SQL text plus positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }
}

fn ensure_column<'a>(schema: &SchemaDescriptor, field: &'a str) -> Result<&'a str> {
    if schema.has_field(field) {
        Ok(field)
    } else {
        Err(StoreError::invalid_query(format!(
            "Unknown column '{}' for table '{}'",
            field, schema.table_name
        )))
    }
}

fn key_column(schema: &SchemaDescriptor) -> Result<&str> {
    schema
        .key_field()
        .map(|f| f.name.as_str())
        .ok_or_else(|| {
            StoreError::invalid_query(format!(
                "Table '{}' has no single key; use criteria instead",
                schema.table_name
            ))
        })
}

/// Build a conjunctive equality WHERE clause (without the `WHERE` keyword)
///
/// Returns an empty clause for empty criteria. A `null` value matches
/// `IS NULL`, since `= NULL` never matches.
pub fn build_where_clause(
    criteria: &Criteria,
    schema: &SchemaDescriptor,
) -> Result<(String, Vec<Value>)> {
    let mut clauses = Vec::with_capacity(criteria.len());
    let mut params = Vec::with_capacity(criteria.len());

    for (field, value) in criteria.iter() {
        let column = quote_identifier(ensure_column(schema, field)?);
        if value.is_null() {
            clauses.push(format!("{} IS NULL", column));
        } else {
            clauses.push(format!("{} = ?", column));
            params.push(value.clone());
        }
    }

    Ok((clauses.join(" AND "), params))
}

/// Build an ORDER BY clause (without the `ORDER BY` keyword)
///
/// The field must be one of the descriptor's columns.
pub fn build_order_by_clause(options: &ListOptions, schema: &SchemaDescriptor) -> Result<String> {
    let field = match options.order_by.as_deref() {
        Some(field) => ensure_column(schema, field).map_err(|_| {
            StoreError::invalid_query(format!(
                "Invalid sort field: '{}'. Must be one of: {}.",
                field,
                schema.column_names().join(", ")
            ))
        })?,
        None => schema.default_order_field(),
    };

    Ok(format!(
        "{} {}",
        quote_identifier(field),
        options.direction.as_sql()
    ))
}

/// `SELECT *` with ordering and optional limit/offset
pub fn select_all(schema: &SchemaDescriptor, options: &ListOptions) -> Result<QueryBuf> {
    let order_by = build_order_by_clause(options, schema)?;
    let mut sql = format!(
        "SELECT * FROM {} ORDER BY {}",
        quote_identifier(&schema.table_name),
        order_by
    );
    let mut params = Vec::new();

    if let Some(limit) = options.limit {
        if limit == 0 {
            return Err(StoreError::invalid_query("limit must be greater than 0"));
        }
        sql.push_str(" LIMIT ?");
        params.push(Value::from(limit));
        if let Some(offset) = options.offset {
            sql.push_str(" OFFSET ?");
            params.push(Value::from(offset));
        }
    }

    Ok(QueryBuf::new(sql, params))
}

pub fn select_by_key(schema: &SchemaDescriptor, key: Key) -> Result<QueryBuf> {
    let sql = format!(
        "SELECT * FROM {} WHERE {} = ?",
        quote_identifier(&schema.table_name),
        quote_identifier(key_column(schema)?)
    );
    Ok(QueryBuf::new(sql, vec![Value::from(key)]))
}

/// `SELECT *` matching the criteria, in default order
///
/// Empty criteria selects every row.
pub fn select_where(schema: &SchemaDescriptor, criteria: &Criteria) -> Result<QueryBuf> {
    let (where_clause, params) = build_where_clause(criteria, schema)?;
    let order_by = build_order_by_clause(&ListOptions::default(), schema)?;
    let table = quote_identifier(&schema.table_name);

    let sql = if where_clause.is_empty() {
        format!("SELECT * FROM {} ORDER BY {}", table, order_by)
    } else {
        format!(
            "SELECT * FROM {} WHERE {} ORDER BY {}",
            table, where_clause, order_by
        )
    };
    Ok(QueryBuf::new(sql, params))
}

/// First row matching the criteria
pub fn select_one_where(schema: &SchemaDescriptor, criteria: &Criteria) -> Result<QueryBuf> {
    let mut query = select_where(schema, criteria)?;
    query.sql.push_str(" LIMIT 1");
    Ok(query)
}

/// `INSERT` with exactly the supplied fields
pub fn insert(schema: &SchemaDescriptor, data: &Record) -> Result<QueryBuf> {
    let mut columns = Vec::with_capacity(data.len());
    let mut params = Vec::with_capacity(data.len());

    for (field, value) in data {
        columns.push(quote_identifier(ensure_column(schema, field)?));
        params.push(value.clone());
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(&schema.table_name),
        columns.join(", "),
        placeholders
    );
    Ok(QueryBuf::new(sql, params))
}

/// Partial `UPDATE` by key; `data` must not be empty
pub fn update(schema: &SchemaDescriptor, key: Key, data: &Record) -> Result<QueryBuf> {
    if data.is_empty() {
        return Err(StoreError::invalid_query("update requires at least one field"));
    }

    let mut set_clauses = Vec::with_capacity(data.len());
    let mut params = Vec::with_capacity(data.len() + 1);

    for (field, value) in data {
        set_clauses.push(format!(
            "{} = ?",
            quote_identifier(ensure_column(schema, field)?)
        ));
        params.push(value.clone());
    }
    params.push(Value::from(key));

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quote_identifier(&schema.table_name),
        set_clauses.join(", "),
        quote_identifier(key_column(schema)?)
    );
    Ok(QueryBuf::new(sql, params))
}

pub fn delete_by_key(schema: &SchemaDescriptor, key: Key) -> Result<QueryBuf> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        quote_identifier(&schema.table_name),
        quote_identifier(key_column(schema)?)
    );
    Ok(QueryBuf::new(sql, vec![Value::from(key)]))
}

/// `DELETE` matching the criteria; empty criteria is rejected
pub fn delete_where(schema: &SchemaDescriptor, criteria: &Criteria) -> Result<QueryBuf> {
    if criteria.is_empty() {
        return Err(StoreError::invalid_query(format!(
            "refusing to delete every row of '{}' without criteria",
            schema.table_name
        )));
    }
    let (where_clause, params) = build_where_clause(criteria, schema)?;
    let sql = format!(
        "DELETE FROM {} WHERE {}",
        quote_identifier(&schema.table_name),
        where_clause
    );
    Ok(QueryBuf::new(sql, params))
}

pub fn count(schema: &SchemaDescriptor, criteria: &Criteria) -> Result<QueryBuf> {
    let (where_clause, params) = build_where_clause(criteria, schema)?;
    let mut sql = format!(
        "SELECT COUNT(*) AS `total` FROM {}",
        quote_identifier(&schema.table_name)
    );
    if !where_clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_clause);
    }
    Ok(QueryBuf::new(sql, params))
}
