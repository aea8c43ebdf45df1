//! SQL generation
//!
//! Identifier sanitization, statement builders and DDL generation.

pub mod ddl;
pub mod query;
pub mod sanitize;

pub use ddl::DdlGenerator;
pub use query::QueryBuf;
pub use sanitize::{MYSQL_RESERVED_WORDS, quote_identifier, validate_identifier};
