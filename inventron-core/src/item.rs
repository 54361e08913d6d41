//! Inventory item records and the rules every write must satisfy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{ValidationError, ValidationErrors};

/// Maximum length of `item_name`, in characters.
pub const MAX_ITEM_NAME_LEN: usize = 100;

/// Repository-assigned identifier of an inventory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A persisted inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InventoryItem {
    /// Assigned by the repository, never by the client.
    pub id: ItemId,
    pub item_name: String,
    pub item_description: String,
    pub item_quantity: i32,
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
}

/// Validated field values ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub item_name: String,
    pub item_description: String,
    pub item_quantity: i32,
}

impl ItemDraft {
    /// Materialize the draft as a stored record.
    pub fn into_item(self, id: ItemId, created_at: DateTime<Utc>) -> InventoryItem {
        InventoryItem {
            id,
            item_name: self.item_name,
            item_description: self.item_description,
            item_quantity: self.item_quantity,
            created_at,
        }
    }
}

/// Validated partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub item_quantity: Option<i32>,
}

impl ItemChanges {
    /// Merge onto the current record, producing the full replacement values.
    pub fn apply_to(&self, current: &InventoryItem) -> ItemDraft {
        ItemDraft {
            item_name: self
                .item_name
                .clone()
                .unwrap_or_else(|| current.item_name.clone()),
            item_description: self
                .item_description
                .clone()
                .unwrap_or_else(|| current.item_description.clone()),
            item_quantity: self.item_quantity.unwrap_or(current.item_quantity),
        }
    }
}

/// Raw item fields as received from a client.
///
/// Values stay untyped until validation so that missing or wrongly typed
/// values surface as field-level errors instead of a body rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ItemFields {
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub item_name: Option<Value>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub item_description: Option<Value>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<i32>))]
    pub item_quantity: Option<Value>,
}

impl ItemFields {
    /// Validate for create: name and description are required, quantity
    /// defaults to zero.
    pub fn into_draft(self) -> Result<ItemDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let item_name = match self.item_name {
            Some(raw) => check_name(&raw, &mut errors),
            None => {
                errors.push(ValidationError::missing("item_name"));
                None
            }
        };
        let item_description = match self.item_description {
            Some(raw) => check_description(&raw, &mut errors),
            None => {
                errors.push(ValidationError::missing("item_description"));
                None
            }
        };
        let item_quantity = match self.item_quantity {
            Some(raw) => check_quantity(&raw, &mut errors),
            None => Some(0),
        };

        match (item_name, item_description, item_quantity) {
            (Some(item_name), Some(item_description), Some(item_quantity)) if errors.is_empty() => {
                Ok(ItemDraft {
                    item_name,
                    item_description,
                    item_quantity,
                })
            }
            _ => Err(errors),
        }
    }

    /// Validate for update: any subset of fields, but at least one.
    pub fn into_changes(self) -> Result<ItemChanges, ValidationErrors> {
        if self.item_name.is_none()
            && self.item_description.is_none()
            && self.item_quantity.is_none()
        {
            return Err(ValidationError::ConstraintViolation {
                constraint: "non_field_errors".to_string(),
                reason: "At least one field must be provided for update.".to_string(),
            }
            .into());
        }

        let mut errors = ValidationErrors::new();
        let changes = ItemChanges {
            item_name: self
                .item_name
                .and_then(|raw| check_name(&raw, &mut errors)),
            item_description: self
                .item_description
                .and_then(|raw| check_description(&raw, &mut errors)),
            item_quantity: self
                .item_quantity
                .and_then(|raw| check_quantity(&raw, &mut errors)),
        };
        errors.into_result(changes)
    }
}

/// Text fields take strings and numbers; numbers are kept in their JSON form.
fn as_text(field: &str, raw: &Value, errors: &mut ValidationErrors) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => {
            errors.push(ValidationError::invalid(field, "Not a valid string."));
            None
        }
    }
}

fn check_name(raw: &Value, errors: &mut ValidationErrors) -> Option<String> {
    let name = as_text("item_name", raw, errors)?;
    if name.is_empty() {
        errors.push(ValidationError::invalid(
            "item_name",
            "This field may not be blank.",
        ));
        return None;
    }
    if name.chars().count() > MAX_ITEM_NAME_LEN {
        errors.push(ValidationError::invalid(
            "item_name",
            format!("Ensure this field has no more than {MAX_ITEM_NAME_LEN} characters."),
        ));
        return None;
    }
    Some(name)
}

fn check_description(raw: &Value, errors: &mut ValidationErrors) -> Option<String> {
    let description = as_text("item_description", raw, errors)?;
    if description.is_empty() {
        errors.push(ValidationError::invalid(
            "item_description",
            "This field may not be blank.",
        ));
        return None;
    }
    Some(description)
}

/// Integers, integral floats (`3.0`) and integer strings (`"10"`, `"10.00"`).
/// Values past the i64 range saturate so the bounds check reports them.
fn as_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else if n.is_u64() {
                Some(i64::MAX)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            }
        }
        Value::String(s) => {
            let s = s.trim();
            let digits = match s.split_once('.') {
                Some((whole, zeros)) if zeros.chars().all(|c| c == '0') => whole,
                Some(_) => return None,
                None => s,
            };
            digits.parse().ok()
        }
        _ => None,
    }
}

fn check_quantity(raw: &Value, errors: &mut ValidationErrors) -> Option<i32> {
    let Some(quantity) = as_integer(raw) else {
        errors.push(ValidationError::invalid(
            "item_quantity",
            "A valid integer is required.",
        ));
        return None;
    };
    if quantity < 0 {
        errors.push(ValidationError::invalid(
            "item_quantity",
            "Ensure this value is greater than or equal to 0.",
        ));
        return None;
    }
    match i32::try_from(quantity) {
        Ok(quantity) => Some(quantity),
        Err(_) => {
            errors.push(ValidationError::invalid(
                "item_quantity",
                format!("Ensure this value is less than or equal to {}.", i32::MAX),
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn fields(name: Option<&str>, description: Option<&str>, quantity: Option<i64>) -> ItemFields {
        ItemFields {
            item_name: name.map(Value::from),
            item_description: description.map(Value::from),
            item_quantity: quantity.map(Value::from),
        }
    }

    fn quantity_of(raw: Value) -> Result<i32, ValidationErrors> {
        ItemFields {
            item_quantity: Some(raw),
            ..fields(Some("Widget"), Some("d"), None)
        }
        .into_draft()
        .map(|draft| draft.item_quantity)
    }

    #[test]
    fn test_draft_defaults_quantity_to_zero() {
        let draft = fields(Some("Widget"), Some("A widget"), None)
            .into_draft()
            .expect("valid draft");
        assert_eq!(draft.item_quantity, 0);
    }

    #[test]
    fn test_draft_trims_whitespace() {
        let draft = fields(Some("  Widget "), Some(" A widget\n"), Some(3))
            .into_draft()
            .expect("valid draft");
        assert_eq!(draft.item_name, "Widget");
        assert_eq!(draft.item_description, "A widget");
    }

    #[test]
    fn test_draft_reports_every_bad_field() {
        let err = fields(None, Some("   "), Some(-1))
            .into_draft()
            .expect_err("invalid draft");
        let map = err.field_map();
        assert!(map.contains_key("item_name"));
        assert!(map.contains_key("item_description"));
        assert!(map.contains_key("item_quantity"));
    }

    #[test]
    fn test_name_length_boundary() {
        let ok = "x".repeat(MAX_ITEM_NAME_LEN);
        assert!(fields(Some(&ok), Some("d"), None).into_draft().is_ok());

        let too_long = "x".repeat(MAX_ITEM_NAME_LEN + 1);
        assert!(fields(Some(&too_long), Some("d"), None).into_draft().is_err());
    }

    #[test]
    fn test_quantity_overflow_rejected() {
        let err = fields(Some("Widget"), Some("d"), Some(i64::from(i32::MAX) + 1))
            .into_draft()
            .expect_err("overflow");
        assert!(err.field_map().contains_key("item_quantity"));
    }

    #[test]
    fn test_quantity_accepts_integer_strings() {
        assert_eq!(quantity_of(json!("10")).ok(), Some(10));
        assert_eq!(quantity_of(json!(" 7 ")).ok(), Some(7));
        assert_eq!(quantity_of(json!("4.00")).ok(), Some(4));
        assert_eq!(quantity_of(json!(3.0)).ok(), Some(3));
    }

    #[test]
    fn test_quantity_rejects_non_integers() {
        for raw in [json!("abc"), json!(1.5), json!("1.5"), json!(true), json!([1])] {
            let err = quantity_of(raw.clone()).expect_err("not an integer");
            assert_eq!(
                err.field_map().get("item_quantity"),
                Some(&vec!["A valid integer is required.".to_string()]),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_quantity_beyond_i64_reports_upper_bound() {
        let err = quantity_of(json!(u64::MAX)).expect_err("too large");
        let reasons = err.field_map().remove("item_quantity").unwrap_or_default();
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].starts_with("Ensure this value is less than or equal to"));
    }

    #[test]
    fn test_text_fields_reject_non_strings() {
        let err = ItemFields {
            item_name: Some(json!({"en": "Widget"})),
            item_description: Some(json!(false)),
            item_quantity: None,
        }
        .into_draft()
        .expect_err("wrong types");
        let map = err.field_map();
        assert_eq!(map.get("item_name"), Some(&vec!["Not a valid string.".to_string()]));
        assert_eq!(
            map.get("item_description"),
            Some(&vec!["Not a valid string.".to_string()])
        );
    }

    #[test]
    fn test_numeric_name_is_kept_as_text() {
        let draft = ItemFields {
            item_name: Some(json!(12345)),
            ..fields(None, Some("d"), None)
        }
        .into_draft()
        .expect("numbers are valid text");
        assert_eq!(draft.item_name, "12345");
    }

    #[test]
    fn test_fields_deserialize_any_json_type() {
        let raw: ItemFields =
            serde_json::from_str(r#"{"item_name": 1, "item_quantity": "abc", "id": 555}"#)
                .expect("any value shape is accepted");
        assert_eq!(raw.item_name, Some(json!(1)));
        assert_eq!(raw.item_quantity, Some(json!("abc")));
        assert!(raw.item_description.is_none());
    }

    #[test]
    fn test_changes_require_a_field() {
        assert!(ItemFields::default().into_changes().is_err());
    }

    #[test]
    fn test_changes_merge_keeps_omitted_fields() {
        let current = InventoryItem {
            id: ItemId::new(1),
            item_name: "Test Item".to_string(),
            item_description: "This is a test item".to_string(),
            item_quantity: 10,
            created_at: Utc::now(),
        };
        let changes = fields(Some("Updated Item"), None, Some(20))
            .into_changes()
            .expect("valid changes");
        let merged = changes.apply_to(&current);
        assert_eq!(merged.item_name, "Updated Item");
        assert_eq!(merged.item_description, "This is a test item");
        assert_eq!(merged.item_quantity, 20);
    }

    #[test]
    fn test_item_serializes_with_wire_field_names() {
        let item = InventoryItem {
            id: ItemId::new(7),
            item_name: "Widget".to_string(),
            item_description: "A widget".to_string(),
            item_quantity: 2,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["id"], 7);
        assert_eq!(json["item_name"], "Widget");
        assert_eq!(json["item_quantity"], 2);
        assert!(json.get("created_at").is_some());
    }

    proptest! {
        #[test]
        fn prop_negative_quantity_always_rejected(q in i64::MIN..0i64) {
            prop_assert!(fields(Some("Widget"), Some("d"), Some(q)).into_draft().is_err());
        }

        #[test]
        fn prop_valid_fields_always_accepted(
            name in "[A-Za-z0-9][A-Za-z0-9 ]{0,98}[A-Za-z0-9]",
            q in 0i64..=i64::from(i32::MAX),
        ) {
            let draft = fields(Some(&name), Some("desc"), Some(q)).into_draft();
            prop_assert!(draft.is_ok());
        }
    }
}
