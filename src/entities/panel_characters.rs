//! Links between panels and character variants
//!
//! A join table keyed by the `(panel_id, character_variant_id)` pair. There is
//! no single key, so records are addressed by the pair.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::accessor::RecordAccessor;
use crate::db::Database;
use crate::error::{Result, StoreError};
use crate::record::{Criteria, Key, Record};
use crate::schema::SchemaDescriptor;
use crate::types::{FieldKind, FieldSpec};
use crate::validation;

use super::EntityService;

pub const TABLE: &str = "panel_characters";

const PANEL_ID: &str = "panel_id";
const VARIANT_ID: &str = "character_variant_id";

pub fn schema() -> SchemaDescriptor {
    SchemaDescriptor::join(
        "PanelCharacter",
        TABLE,
        PANEL_ID,
        VARIANT_ID,
        vec![
            FieldSpec::new(PANEL_ID, FieldKind::Integer).required(),
            FieldSpec::new(VARIANT_ID, FieldKind::Integer).required(),
        ],
    )
}

fn pair(panel_id: impl Into<Value>, variant_id: impl Into<Value>) -> Criteria {
    Criteria::new().eq(PANEL_ID, panel_id).eq(VARIANT_ID, variant_id)
}

pub struct PanelCharacters {
    accessor: RecordAccessor,
}

impl PanelCharacters {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            accessor: RecordAccessor::new(db, schema()),
        }
    }

    pub async fn find_by_panel(&self, panel_id: Key) -> Result<Vec<Record>> {
        self.accessor
            .find_where(&Criteria::new().eq(PANEL_ID, panel_id))
            .await
    }

    pub async fn find_by_variant(&self, variant_id: Key) -> Result<Vec<Record>> {
        self.accessor
            .find_where(&Criteria::new().eq(VARIANT_ID, variant_id))
            .await
    }

    /// Unlink a variant from a panel, `true` if the link existed
    pub async fn remove(&self, panel_id: Key, variant_id: Key) -> Result<bool> {
        self.accessor
            .delete_where(&pair(panel_id, variant_id))
            .await
    }
}

#[async_trait]
impl EntityService for PanelCharacters {
    fn accessor(&self) -> &RecordAccessor {
        &self.accessor
    }

    /// Link a variant to a panel; an existing pair is a duplicate
    async fn create(&self, data: &Value) -> Result<Record> {
        self.validate(data, false).into_result()?;
        let clean = validation::sanitize_create(self.schema(), data);

        let criteria = pair(
            clean.get(PANEL_ID).cloned().unwrap_or(Value::Null),
            clean.get(VARIANT_ID).cloned().unwrap_or(Value::Null),
        );
        if !self.accessor.find_where(&criteria).await?.is_empty() {
            tracing::warn!(table = TABLE, "rejected duplicate link");
            return Err(StoreError::duplicate(
                "This character variant is already in this panel",
            ));
        }

        self.accessor.insert(clean).await
    }
}
