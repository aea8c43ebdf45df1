//! Characters within a project

use std::sync::Arc;

use crate::accessor::RecordAccessor;
use crate::db::Database;
use crate::error::Result;
use crate::record::{Criteria, Key, Record};
use crate::schema::SchemaDescriptor;
use crate::types::{FieldKind, FieldSpec};

use super::EntityService;

pub const TABLE: &str = "characters";

pub fn schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "Character",
        TABLE,
        vec![
            FieldSpec::key("id"),
            FieldSpec::new("project_id", FieldKind::Integer).required(),
            FieldSpec::short_text("name", 255).required(),
            FieldSpec::new("description", FieldKind::LongText),
            FieldSpec::short_text("default_variant", 255),
            FieldSpec::short_text("variant", 255),
            FieldSpec::short_text("reference_img", 500),
        ],
    )
    .with_timestamps()
}

pub struct Characters {
    accessor: RecordAccessor,
}

impl Characters {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            accessor: RecordAccessor::new(db, schema()),
        }
    }

    pub async fn find_by_project(&self, project_id: Key) -> Result<Vec<Record>> {
        self.accessor
            .find_where(&Criteria::new().eq("project_id", project_id))
            .await
    }
}

impl EntityService for Characters {
    fn accessor(&self) -> &RecordAccessor {
        &self.accessor
    }
}
