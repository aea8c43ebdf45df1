//! Storyboard panels

use std::sync::Arc;

use serde_json::Value;

use crate::accessor::RecordAccessor;
use crate::db::Database;
use crate::error::Result;
use crate::record::{Criteria, Key, PanelWithCharacters, Record};
use crate::schema::SchemaDescriptor;
use crate::sql::quote_identifier;
use crate::types::{FieldKind, FieldSpec};

use super::{EntityService, character_variants, characters, panel_characters};

pub const TABLE: &str = "panels";

pub fn schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "Panel",
        TABLE,
        vec![
            FieldSpec::key("id"),
            FieldSpec::new("project_id", FieldKind::Integer).required(),
            FieldSpec::new("setting_id", FieldKind::Integer),
            FieldSpec::short_text("image_link", 500),
            FieldSpec::short_text("shot_type", 100),
            FieldSpec::short_text("aspect_ratio", 50),
            FieldSpec::new("description", FieldKind::LongText),
            FieldSpec::short_text("reference_img", 500),
        ],
    )
    .with_timestamps()
}

/// Variants linked to one panel, each with its parent character's name
fn linked_variants_sql() -> String {
    format!(
        "SELECT cv.*, c.`name` AS `character_name` \
         FROM {} cv \
         JOIN {} pc ON cv.`id` = pc.`character_variant_id` \
         JOIN {} c ON cv.`character_id` = c.`id` \
         WHERE pc.`panel_id` = ? \
         ORDER BY cv.`id` ASC",
        quote_identifier(character_variants::TABLE),
        quote_identifier(panel_characters::TABLE),
        quote_identifier(characters::TABLE),
    )
}

pub struct Panels {
    accessor: RecordAccessor,
    variants: RecordAccessor,
}

impl Panels {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            accessor: RecordAccessor::new(db.clone(), schema()),
            variants: RecordAccessor::new(db, character_variants::schema()),
        }
    }

    pub async fn find_by_project(&self, project_id: Key) -> Result<Vec<Record>> {
        self.accessor
            .find_where(&Criteria::new().eq("project_id", project_id))
            .await
    }

    /// The panel plus its linked character variants, ordered by variant key
    ///
    /// `None` when the panel does not exist. A panel with no links has an empty
    /// `characters` list.
    pub async fn get_with_character_variants(
        &self,
        key: Key,
    ) -> Result<Option<PanelWithCharacters>> {
        let Some(panel) = self.accessor.get_by_key(key).await? else {
            return Ok(None);
        };
        let characters = self
            .variants
            .fetch(&linked_variants_sql(), &[Value::from(key)])
            .await?;
        Ok(Some(PanelWithCharacters { panel, characters }))
    }
}

impl EntityService for Panels {
    fn accessor(&self) -> &RecordAccessor {
        &self.accessor
    }
}
