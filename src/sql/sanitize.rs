//! SQL Identifier Sanitization Utilities
//!
//! Provides functions to safely quote and validate MySQL identifiers.

use std::sync::LazyLock;

use regex::Regex;

/// MySQL reserved words that cannot be used as unquoted identifiers
pub const MYSQL_RESERVED_WORDS: &[&str] = &[
    "ADD",
    "ALL",
    "ALTER",
    "AND",
    "AS",
    "ASC",
    "BETWEEN",
    "BY",
    "CASCADE",
    "CASE",
    "CHARACTER",
    "CHECK",
    "COLUMN",
    "CONSTRAINT",
    "CREATE",
    "CROSS",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURRENT_USER",
    "DATABASE",
    "DEFAULT",
    "DELETE",
    "DESC",
    "DISTINCT",
    "DROP",
    "ELSE",
    "EXISTS",
    "FALSE",
    "FOR",
    "FOREIGN",
    "FROM",
    "GRANT",
    "GROUP",
    "HAVING",
    "IN",
    "INDEX",
    "INNER",
    "INSERT",
    "INTERVAL",
    "INTO",
    "IS",
    "JOIN",
    "KEY",
    "KEYS",
    "LEFT",
    "LIKE",
    "LIMIT",
    "LOCK",
    "NOT",
    "NULL",
    "ON",
    "OR",
    "ORDER",
    "OUTER",
    "PRIMARY",
    "REFERENCES",
    "RENAME",
    "REPLACE",
    "RIGHT",
    "SELECT",
    "SET",
    "SHOW",
    "TABLE",
    "THEN",
    "TO",
    "TRUE",
    "UNION",
    "UNIQUE",
    "UPDATE",
    "USE",
    "USING",
    "VALUES",
    "WHEN",
    "WHERE",
    "WITH",
];

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("identifier pattern is valid"));

/// Quote a SQL identifier to make it safe for use in queries
///
/// # Example
/// ```
/// use storyboard_store::sql::quote_identifier;
///
/// assert_eq!(quote_identifier("users"), "`users`");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    // Escape any backticks in the identifier by doubling them
    let escaped = identifier.replace('`', "``");
    format!("`{}`", escaped)
}

/// Validate a table or column name
///
/// Rules:
/// - Must start with a lowercase letter
/// - Can only contain lowercase letters, numbers, and underscores
/// - Cannot be a MySQL reserved word
/// - Cannot be one of `reserved_columns`
///
/// Statements always backtick-quote identifiers through [`quote_identifier`],
/// so these rules are a naming policy for descriptors, not the injection guard.
///
/// # Example
/// ```
/// use storyboard_store::sql::validate_identifier;
///
/// assert!(validate_identifier("panels", &[]).is_ok());
/// assert!(validate_identifier("select", &[]).is_err());
/// assert!(validate_identifier("id", &["id"]).is_err());
/// ```
pub fn validate_identifier(name: &str, reserved_columns: &[&str]) -> Result<(), String> {
    if name.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    if !IDENTIFIER.is_match(name) {
        return Err(format!(
            "Identifier '{}' is invalid. Must start with a lowercase letter and contain only lowercase letters, numbers, and underscores.",
            name
        ));
    }

    if MYSQL_RESERVED_WORDS.contains(&name.to_uppercase().as_str()) {
        return Err(format!(
            "Identifier '{}' is a MySQL reserved word and cannot be used.",
            name
        ));
    }

    if reserved_columns.contains(&name) {
        return Err(format!(
            "Column name '{}' is reserved and cannot be used.",
            name
        ));
    }

    Ok(())
}
