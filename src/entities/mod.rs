//! Entity services
//!
//! One module per entity: its schema descriptor plus a service holding a
//! [`RecordAccessor`]. The create/update flow shared by every entity lives in
//! the [`EntityService`] default methods.

pub mod character_variants;
pub mod characters;
pub mod panel_characters;
pub mod panels;
pub mod projects;
pub mod settings;
pub mod users;

use async_trait::async_trait;
use serde_json::Value;

use crate::accessor::RecordAccessor;
use crate::error::Result;
use crate::record::{Criteria, Key, ListOptions, Record};
use crate::schema::SchemaDescriptor;
use crate::validation::{self, ValidationReport};

pub use character_variants::CharacterVariants;
pub use characters::Characters;
pub use panel_characters::PanelCharacters;
pub use panels::Panels;
pub use projects::Projects;
pub use settings::Settings;
pub use users::Users;

/// Descriptors of every entity, in table dependency order
pub fn all_schemas() -> Vec<SchemaDescriptor> {
    vec![
        users::schema(),
        projects::schema(),
        characters::schema(),
        character_variants::schema(),
        settings::schema(),
        panels::schema(),
        panel_characters::schema(),
    ]
}

/// Look up a descriptor by entity name (`User`) or table name (`users`)
pub fn schema_for(name: &str) -> Option<SchemaDescriptor> {
    all_schemas()
        .into_iter()
        .find(|s| s.entity.eq_ignore_ascii_case(name) || s.table_name == name)
}

/// Validated CRUD over one entity
#[async_trait]
pub trait EntityService: Send + Sync {
    fn accessor(&self) -> &RecordAccessor;

    fn schema(&self) -> &SchemaDescriptor {
        self.accessor().schema()
    }

    /// Check input without touching the store
    fn validate(&self, data: &Value, is_partial: bool) -> ValidationReport {
        validation::validate(self.schema(), data, is_partial)
    }

    /// Validate, check uniqueness, sanitize and insert
    async fn create(&self, data: &Value) -> Result<Record> {
        self.validate(data, false).into_result()?;
        let clean = validation::sanitize_create(self.schema(), data);
        validation::ensure_unique(self.accessor(), &clean, None).await?;
        let created = self.accessor().insert(clean).await?;
        tracing::debug!(table = %self.schema().table_name, "record created");
        Ok(created)
    }

    /// Validate and overwrite the supplied fields; `None` when absent
    async fn update(&self, key: Key, data: &Value) -> Result<Option<Record>> {
        self.validate(data, true).into_result()?;
        let clean = validation::sanitize_update(self.schema(), data);
        validation::ensure_unique(self.accessor(), &clean, Some(key)).await?;
        self.accessor().update(key, clean).await
    }

    async fn get(&self, key: Key) -> Result<Option<Record>> {
        self.accessor().get_by_key(key).await
    }

    async fn list(&self, options: &ListOptions) -> Result<Vec<Record>> {
        self.accessor().list_all(options).await
    }

    async fn delete(&self, key: Key) -> Result<bool> {
        self.accessor().delete_by_key(key).await
    }

    async fn count(&self, criteria: &Criteria) -> Result<u64> {
        self.accessor().count(criteria).await
    }

    async fn exists(&self, key: Key) -> Result<bool> {
        self.accessor().exists(key).await
    }
}
