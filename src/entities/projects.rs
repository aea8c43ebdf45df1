//! Projects, owned by a user

use std::sync::Arc;

use crate::accessor::RecordAccessor;
use crate::db::Database;
use crate::error::Result;
use crate::record::{Criteria, Key, Record};
use crate::schema::SchemaDescriptor;
use crate::types::{FieldKind, FieldSpec};

use super::EntityService;

pub const TABLE: &str = "projects";

pub fn schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "Project",
        TABLE,
        vec![
            FieldSpec::key("id"),
            FieldSpec::new("user_id", FieldKind::Integer).required(),
            FieldSpec::short_text("project_title", 255).required(),
            FieldSpec::short_text("art_style", 255),
            FieldSpec::new("description", FieldKind::LongText),
        ],
    )
    .with_timestamps()
}

pub struct Projects {
    accessor: RecordAccessor,
}

impl Projects {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            accessor: RecordAccessor::new(db, schema()),
        }
    }

    pub async fn find_by_user(&self, user_id: Key) -> Result<Vec<Record>> {
        self.accessor
            .find_where(&Criteria::new().eq("user_id", user_id))
            .await
    }
}

impl EntityService for Projects {
    fn accessor(&self) -> &RecordAccessor {
        &self.accessor
    }
}
