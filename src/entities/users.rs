//! Users

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::accessor::RecordAccessor;
use crate::db::Database;
use crate::error::Result;
use crate::record::{Criteria, ListOptions, Record};
use crate::schema::SchemaDescriptor;
use crate::sql::quote_identifier;
use crate::types::FieldSpec;

use super::EntityService;

pub const TABLE: &str = "users";

pub fn schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "User",
        TABLE,
        vec![
            FieldSpec::key("id"),
            FieldSpec::short_text("email", 255)
                .required()
                .unique()
                .email()
                .lowercase(),
            FieldSpec::short_text("name", 255).required(),
        ],
    )
    .with_timestamps()
}

/// Signup counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_users: u64,
    pub today_signups: u64,
    pub week_signups: u64,
    pub month_signups: u64,
}

pub struct Users {
    accessor: RecordAccessor,
}

impl Users {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            accessor: RecordAccessor::new(db, schema()),
        }
    }

    /// Case-insensitive lookup
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Record>> {
        let criteria = Criteria::new().eq("email", email.trim().to_lowercase());
        self.accessor.find_one_where(&criteria).await
    }

    /// Users whose name or email contains `term`, ordered by name
    pub async fn search(&self, term: &str) -> Result<Vec<Record>> {
        let sql = format!(
            "SELECT * FROM {} WHERE `name` LIKE ? OR `email` LIKE ? ORDER BY `name` ASC",
            quote_identifier(TABLE)
        );
        let pattern = Value::String(format!("%{}%", escape_like(term)));
        self.accessor.fetch(&sql, &[pattern.clone(), pattern]).await
    }

    /// The newest `limit` users
    pub async fn recent(&self, limit: u64) -> Result<Vec<Record>> {
        let options = ListOptions::new()
            .limit(limit)
            .order_by("created_at")
            .descending();
        self.accessor.list_all(&options).await
    }

    pub async fn stats(&self) -> Result<UserStats> {
        let sql = format!(
            "SELECT \
             COUNT(*) AS `total_users`, \
             COUNT(CASE WHEN DATE(`created_at`) = CURDATE() THEN 1 END) AS `today_signups`, \
             COUNT(CASE WHEN `created_at` >= DATE_SUB(NOW(), INTERVAL 7 DAY) THEN 1 END) AS `week_signups`, \
             COUNT(CASE WHEN `created_at` >= DATE_SUB(NOW(), INTERVAL 30 DAY) THEN 1 END) AS `month_signups` \
             FROM {}",
            quote_identifier(TABLE)
        );
        let rows = self.accessor.fetch(&sql, &[]).await?;
        let Some(row) = rows.first() else {
            return Ok(UserStats::default());
        };
        let count = |name: &str| row.get(name).and_then(Value::as_u64).unwrap_or(0);
        Ok(UserStats {
            total_users: count("total_users"),
            today_signups: count("today_signups"),
            week_signups: count("week_signups"),
            month_signups: count("month_signups"),
        })
    }
}

impl EntityService for Users {
    fn accessor(&self) -> &RecordAccessor {
        &self.accessor
    }
}

/// Escape LIKE wildcards so the term matches literally
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
