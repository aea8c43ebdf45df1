//! Variants of a character (costume, age, mood)

use std::sync::Arc;

use crate::accessor::RecordAccessor;
use crate::db::Database;
use crate::error::Result;
use crate::record::{Criteria, Key, Record};
use crate::schema::SchemaDescriptor;
use crate::types::{FieldKind, FieldSpec};

use super::EntityService;

pub const TABLE: &str = "character_variants";

pub fn schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "CharacterVariant",
        TABLE,
        vec![
            FieldSpec::key("id"),
            FieldSpec::new("character_id", FieldKind::Integer).required(),
            FieldSpec::short_text("name", 255).required(),
            FieldSpec::new("description", FieldKind::LongText),
            FieldSpec::short_text("reference_img", 500),
        ],
    )
    .with_timestamps()
}

pub struct CharacterVariants {
    accessor: RecordAccessor,
}

impl CharacterVariants {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            accessor: RecordAccessor::new(db, schema()),
        }
    }

    pub async fn find_by_character(&self, character_id: Key) -> Result<Vec<Record>> {
        self.accessor
            .find_where(&Criteria::new().eq("character_id", character_id))
            .await
    }
}

impl EntityService for CharacterVariants {
    fn accessor(&self) -> &RecordAccessor {
        &self.accessor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedDatabase;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_read_back() {
        let db = Arc::new(
            ScriptedDatabase::new()
                .exec(1, Some(8))
                .rows(vec![json!({"id": 8, "character_id": 2, "name": "Winter coat"})]),
        );
        let variant = CharacterVariants::new(db.clone())
            .create(&json!({"character_id": 2, "name": "Winter coat"}))
            .await
            .unwrap();

        assert_eq!(variant["id"], json!(8));
        assert_eq!(variant["name"], json!("Winter coat"));
    }

    #[tokio::test]
    async fn test_find_by_character() {
        let db = Arc::new(ScriptedDatabase::new().no_rows());
        CharacterVariants::new(db.clone())
            .find_by_character(2)
            .await
            .unwrap();
        assert!(db.sql()[0].contains("WHERE `character_id` = ?"));
    }
}
