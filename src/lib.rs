//! # storyboard-store
//!
//! Schema-driven MySQL persistence for a storyboarding application.
//!
//! Users own projects. Projects contain characters (with variants), settings
//! and panels. Panels reference a setting and link to character variants
//! through the `panel_characters` join table.
//!
//! ## Features
//!
//! - **Declarative Schemas**: one [`SchemaDescriptor`] per entity drives validation and DDL
//! - **Generic Record Accessor**: table-agnostic CRUD with parameterized statements
//! - **Entity Services**: validated create/update with case-insensitive uniqueness
//! - **Migrations**: `CREATE TABLE IF NOT EXISTS` artifacts and a filename-ordered runner
//! - **SQL Injection Prevention**: identifiers are quoted and checked against the descriptor
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use storyboard_store::{EntityService, StoreConfig, StoryboardStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::builder("mysql://root@localhost:3306/flowboarder_db").build();
//!     let store = StoryboardStore::new(config).await?;
//!     store.migrations().run().await?;
//!
//!     let user = store
//!         .users()
//!         .create(&serde_json::json!({"email": "ada@example.com", "name": "Ada"}))
//!         .await?;
//!     let project = store
//!         .projects()
//!         .create(&serde_json::json!({"user_id": user["id"], "project_title": "Pilot"}))
//!         .await?;
//!
//!     println!("{}", project["project_title"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use storyboard_store::StoreConfig;
//!
//! let config = StoreConfig::builder("mysql://localhost/flowboarder_db")
//!     .max_connections(10)                   // Pool size (default)
//!     .migrations_dir("database/migrations") // Artifact directory (default)
//!     .migrations_table("migrations")        // Bookkeeping table (default)
//!     .build();
//! ```
//!
//! `StoreConfig::from_env()` reads the same settings from the environment,
//! loading `.env` first.

pub mod accessor;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod migration;
pub mod record;
pub mod schema;
pub mod sql;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use accessor::RecordAccessor;
pub use config::{StoreConfig, StoreConfigBuilder};
pub use db::{Database, ExecOutcome, MySqlDatabase};
pub use entities::{
    CharacterVariants, Characters, EntityService, PanelCharacters, Panels, Projects, Settings,
    Users,
};
pub use error::{Result, StoreError};
pub use migration::{MigrationArtifact, MigrationRunner, MigrationStatus};
pub use record::{Criteria, Key, ListOptions, PanelWithCharacters, Record, SortDirection};
pub use schema::{SchemaDescriptor, TableKind};
pub use store::StoryboardStore;
pub use types::{DefaultValue, FieldFormat, FieldKind, FieldSpec};
pub use validation::ValidationReport;

// Re-export SQL utilities for advanced users
pub use sql::ddl::DdlGenerator;
pub use sql::sanitize::{quote_identifier, validate_identifier};
