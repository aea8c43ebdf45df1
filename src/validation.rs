//! Descriptor-driven input validation and sanitization
//!
//! Validation accumulates every message in descriptor order. Sanitization
//! projects input onto the fields a caller may supply and normalizes values
//! to their stored form.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::accessor::RecordAccessor;
use crate::error::{Result, StoreError};
use crate::record::{Criteria, Key, Record, record_key};
use crate::schema::SchemaDescriptor;
use crate::types::{FieldFormat, FieldKind, FieldSpec};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Outcome of validating one input object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Convert a failed report into `StoreError::Validation`
    pub fn into_result(self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(StoreError::validation(self.errors))
        }
    }
}

/// Validate input against a descriptor
///
/// `is_partial` selects update rules: absent fields are never an error, but
/// a present `null` on a required field is.
pub fn validate(schema: &SchemaDescriptor, data: &Value, is_partial: bool) -> ValidationReport {
    let Some(obj) = data.as_object() else {
        return ValidationReport::from_errors(vec!["data must be an object".to_string()]);
    };

    let mut errors = Vec::new();
    for field in schema.input_fields() {
        check_field(field, obj.get(&field.name), is_partial, &mut errors);
    }
    ValidationReport::from_errors(errors)
}

/// Push every rule `value` breaks; presence and type failures end the checks
fn check_field(
    field: &FieldSpec,
    value: Option<&Value>,
    is_partial: bool,
    errors: &mut Vec<String>,
) {
    let name = &field.name;

    let value = match value {
        None if field.required && !is_partial => {
            errors.push(format!("{name} is required"));
            return;
        }
        None => return,
        Some(Value::Null) if field.required => {
            errors.push(if is_partial {
                format!("{name} cannot be null")
            } else {
                format!("{name} is required")
            });
            return;
        }
        Some(Value::Null) => return,
        Some(value) => value,
    };

    if let Err(expected) = field.kind.validate_value(value) {
        errors.push(format!("{name} must be {expected}"));
        return;
    }

    let Some(text) = value.as_str().filter(|_| field.kind.is_text()) else {
        return;
    };
    let text = text.trim();

    if text.is_empty() {
        if field.required {
            errors.push(format!("{name} must be a non-empty string"));
        }
        return;
    }

    if let (FieldKind::ShortText, Some(max)) = (field.kind, field.max_length) {
        if text.chars().count() > max as usize {
            errors.push(format!("{name} must be at most {max} characters"));
        }
    }

    if field.format == Some(FieldFormat::Email) && !EMAIL.is_match(text) {
        errors.push(format!("{name} has an invalid email format"));
    }
}

/// Sanitized projection for an insert
///
/// Absent optional fields without a default become `null`; absent fields
/// with a default are left to the store.
pub fn sanitize_create(schema: &SchemaDescriptor, data: &Value) -> Record {
    sanitize(schema, data, false)
}

/// Sanitized projection of the supplied fields for an update
pub fn sanitize_update(schema: &SchemaDescriptor, data: &Value) -> Record {
    sanitize(schema, data, true)
}

fn sanitize(schema: &SchemaDescriptor, data: &Value, is_partial: bool) -> Record {
    let empty = Record::new();
    let obj = data.as_object().unwrap_or(&empty);
    let mut out = Record::new();

    for field in schema.input_fields() {
        match obj.get(&field.name) {
            Some(value) => {
                out.insert(field.name.clone(), normalize(field, value));
            }
            None if !is_partial && field.default_value.is_none() => {
                out.insert(field.name.clone(), Value::Null);
            }
            None => {}
        }
    }
    out
}

fn normalize(field: &FieldSpec, value: &Value) -> Value {
    match field.kind.coerce(value) {
        Value::String(s) if s.is_empty() && !field.required => Value::Null,
        Value::String(s) if field.lowercase => Value::String(s.to_lowercase()),
        other => other,
    }
}

/// Reject values that collide with another record on a unique field
///
/// `data` must already be sanitized so lookups use the normalized value.
/// For updates pass the record's own key; a match on that key is not a
/// conflict.
pub async fn ensure_unique(
    accessor: &RecordAccessor,
    data: &Record,
    current_key: Option<Key>,
) -> Result<()> {
    let schema = accessor.schema();
    let key_field = schema.key_field().map(|f| f.name.as_str());

    for field in schema.unique_fields() {
        let Some(value) = data.get(&field.name).filter(|v| !v.is_null()) else {
            continue;
        };

        let criteria = Criteria::new().eq(field.name.as_str(), value.clone());
        let Some(existing) = accessor.find_one_where(&criteria).await? else {
            continue;
        };

        let same_record = match (current_key, key_field) {
            (Some(key), Some(key_field)) => record_key(&existing, key_field) == Some(key),
            _ => false,
        };
        if !same_record {
            tracing::warn!(
                table = %schema.table_name,
                field = %field.name,
                "rejected duplicate value"
            );
            return Err(StoreError::duplicate(format!("{} already exists", field.name)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DefaultValue;
    use serde_json::json;

    fn users() -> SchemaDescriptor {
        SchemaDescriptor::new(
            "User",
            "users",
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

    fn panels() -> SchemaDescriptor {
        SchemaDescriptor::new(
            "Panel",
            "panels",
            vec![
                FieldSpec::key("id"),
                FieldSpec::new("project_id", FieldKind::Integer).required(),
                FieldSpec::new("setting_id", FieldKind::Integer),
                FieldSpec::short_text("shot_type", 10),
                FieldSpec::short_text("aspect_ratio", 50).default(DefaultValue::Text("16:9".into())),
                FieldSpec::new("description", FieldKind::LongText),
            ],
        )
        .with_timestamps()
    }

    // ==================== validate ====================

    #[test]
    fn test_valid_create() {
        let report = validate(&users(), &json!({"email": "ada@example.com", "name": "Ada"}), false);
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_missing_required_fields_in_descriptor_order() {
        let report = validate(&users(), &json!({}), false);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["email is required", "name is required"]);
    }

    #[test]
    fn test_non_object_input() {
        let report = validate(&users(), &json!(["email"]), false);
        assert_eq!(report.errors, vec!["data must be an object"]);
    }

    #[test]
    fn test_blank_required_string() {
        let report = validate(&users(), &json!({"email": "a@b.co", "name": "   "}), false);
        assert_eq!(report.errors, vec!["name must be a non-empty string"]);

        let report = validate(&users(), &json!({"name": ""}), true);
        assert_eq!(report.errors, vec!["name must be a non-empty string"]);
    }

    #[test]
    fn test_email_format() {
        for bad in ["plain", "a@b", "a b@c.d", "@c.d"] {
            let report = validate(&users(), &json!({"email": bad, "name": "Ada"}), false);
            assert_eq!(report.errors, vec!["email has an invalid email format"], "{bad}");
        }
    }

    #[test]
    fn test_max_length_counts_characters() {
        let schema = panels();
        let ok = validate(&schema, &json!({"project_id": 1, "shot_type": "éééééééééé"}), false);
        assert!(ok.valid);

        let long = validate(&schema, &json!({"project_id": 1, "shot_type": "extreme wide"}), false);
        assert_eq!(long.errors, vec!["shot_type must be at most 10 characters"]);
    }

    #[test]
    fn test_long_malformed_email_reports_every_rule() {
        let report = validate(&users(), &json!({"email": "x".repeat(300), "name": "Ada"}), false);
        assert_eq!(
            report.errors,
            vec![
                "email must be at most 255 characters",
                "email has an invalid email format"
            ]
        );
    }

    #[test]
    fn test_type_mismatch() {
        let report = validate(
            &panels(),
            &json!({"project_id": "abc", "description": 5}),
            false,
        );
        assert_eq!(
            report.errors,
            vec!["project_id must be an integer", "description must be a string"]
        );
    }

    #[test]
    fn test_numeric_string_accepted_for_integer() {
        assert!(validate(&panels(), &json!({"project_id": "7"}), false).valid);
    }

    #[test]
    fn test_partial_update_rules() {
        let schema = users();
        assert!(validate(&schema, &json!({}), true).valid);
        assert!(validate(&schema, &json!({"name": "Grace"}), true).valid);

        let report = validate(&schema, &json!({"email": null}), true);
        assert_eq!(report.errors, vec!["email cannot be null"]);
    }

    #[test]
    fn test_null_on_create_is_required() {
        let report = validate(&users(), &json!({"email": null, "name": "Ada"}), false);
        assert_eq!(report.errors, vec!["email is required"]);
    }

    #[test]
    fn test_optional_null_and_blank_are_valid() {
        let report = validate(
            &panels(),
            &json!({"project_id": 1, "setting_id": null, "shot_type": "  "}),
            false,
        );
        assert!(report.valid);
    }

    #[test]
    fn test_managed_and_key_fields_are_ignored() {
        let report = validate(
            &users(),
            &json!({"id": "x", "created_at": 5, "email": "a@b.co", "name": "Ada"}),
            false,
        );
        assert!(report.valid);
    }

    #[test]
    fn test_into_result() {
        let err = validate(&users(), &json!({}), false).into_result().unwrap_err();
        assert_eq!(err.validation_errors(), ["email is required", "name is required"]);
        assert!(validate(&users(), &json!({"email": "a@b.co", "name": "A"}), false)
            .into_result()
            .is_ok());
    }

    // ==================== sanitize ====================

    #[test]
    fn test_sanitize_create_user() {
        let data = json!({
            "id": 99,
            "email": "  Ada@Example.COM ",
            "name": " Ada ",
            "role": "admin",
            "created_at": "2020-01-01 00:00:00"
        });
        let clean = sanitize_create(&users(), &data);

        assert_eq!(Value::Object(clean), json!({"email": "ada@example.com", "name": "Ada"}));
    }

    #[test]
    fn test_sanitize_create_fills_optional_nulls_and_skips_defaults() {
        let clean = sanitize_create(&panels(), &json!({"project_id": "3", "shot_type": " "}));

        assert_eq!(clean["project_id"], json!(3));
        assert_eq!(clean["setting_id"], Value::Null);
        assert_eq!(clean["shot_type"], Value::Null);
        assert_eq!(clean["description"], Value::Null);
        assert!(!clean.contains_key("aspect_ratio"));
    }

    #[test]
    fn test_sanitize_update_only_supplied_fields() {
        let clean = sanitize_update(&panels(), &json!({"description": " close on hands "}));
        assert_eq!(Value::Object(clean), json!({"description": "close on hands"}));

        assert!(sanitize_update(&panels(), &json!({})).is_empty());
    }

    // ==================== ensure_unique ====================

    mod unique {
        use super::*;
        use crate::testing::{ScriptedDatabase, rec};
        use serde_json::json;
        use std::sync::Arc;

        fn accessor(db: &Arc<ScriptedDatabase>) -> RecordAccessor {
            RecordAccessor::new(db.clone(), users())
        }

        #[tokio::test]
        async fn test_no_match_passes() {
            let db = Arc::new(ScriptedDatabase::new().no_rows());
            let data = rec(json!({"email": "ada@example.com", "name": "Ada"}));
            assert!(ensure_unique(&accessor(&db), &data, None).await.is_ok());

            let (sql, params) = &db.statements()[0];
            assert!(sql.contains("WHERE `email` = ?"));
            assert_eq!(params, &vec![json!("ada@example.com")]);
        }

        #[tokio::test]
        async fn test_match_is_duplicate() {
            let db = Arc::new(ScriptedDatabase::new().rows(vec![json!({"id": 1})]));
            let data = rec(json!({"email": "ada@example.com"}));
            let err = ensure_unique(&accessor(&db), &data, None).await.unwrap_err();
            assert!(matches!(err, StoreError::Duplicate(_)));
            assert!(err.is_client_error());
        }

        #[tokio::test]
        async fn test_match_on_own_key_is_not_duplicate() {
            let db = Arc::new(ScriptedDatabase::new().rows(vec![json!({"id": 5})]));
            let data = rec(json!({"email": "ada@example.com"}));
            assert!(ensure_unique(&accessor(&db), &data, Some(5)).await.is_ok());
        }

        #[tokio::test]
        async fn test_absent_unique_field_skips_lookup() {
            let db = Arc::new(ScriptedDatabase::new());
            let data = rec(json!({"name": "Grace"}));
            assert!(ensure_unique(&accessor(&db), &data, Some(5)).await.is_ok());
            assert!(db.statements().is_empty());
        }
    }
}
