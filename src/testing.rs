//! Scripted in-memory [`Database`] for unit tests
//!
//! Replies are consumed in order; every statement is recorded so tests can
//! assert on the SQL the accessor issued.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::db::{Database, ExecOutcome};
use crate::error::{Result, StoreError};
use crate::record::Record;

enum Reply {
    Rows(Vec<Record>),
    Exec(ExecOutcome),
    Fail(String),
}

#[derive(Default)]
pub(crate) struct ScriptedDatabase {
    replies: Mutex<VecDeque<Reply>>,
    statements: Mutex<Vec<(String, Vec<Value>)>>,
}

/// Convert a JSON object literal into a record
pub(crate) fn rec(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

impl ScriptedDatabase {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a query reply
    pub(crate) fn rows(self, rows: Vec<Value>) -> Self {
        self.push(Reply::Rows(rows.into_iter().map(rec).collect()))
    }

    /// Queue an empty query reply
    pub(crate) fn no_rows(self) -> Self {
        self.push(Reply::Rows(Vec::new()))
    }

    /// Queue a write reply
    pub(crate) fn exec(self, rows_affected: u64, last_insert_id: Option<u64>) -> Self {
        self.push(Reply::Exec(ExecOutcome {
            rows_affected,
            last_insert_id,
        }))
    }

    /// Queue a store failure
    pub(crate) fn fail(self, message: &str) -> Self {
        self.push(Reply::Fail(message.to_string()))
    }

    fn push(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Statements issued so far
    pub(crate) fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.statements.lock().unwrap().clone()
    }

    pub(crate) fn sql(&self) -> Vec<String> {
        self.statements().into_iter().map(|(sql, _)| sql).collect()
    }

    fn next(&self, sql: &str, params: &[Value]) -> Result<Reply> {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| StoreError::database(format!("no scripted reply for: {sql}")))
    }
}

#[async_trait]
impl Database for ScriptedDatabase {
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        match self.next(sql, params)? {
            Reply::Rows(rows) => Ok(rows),
            Reply::Fail(message) => Err(StoreError::database(message)),
            Reply::Exec(_) => Err(StoreError::database(format!(
                "scripted a write reply for query: {sql}"
            ))),
        }
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome> {
        match self.next(sql, params)? {
            Reply::Exec(outcome) => Ok(outcome),
            Reply::Fail(message) => Err(StoreError::database(message)),
            Reply::Rows(_) => Err(StoreError::database(format!(
                "scripted a query reply for write: {sql}"
            ))),
        }
    }
}
