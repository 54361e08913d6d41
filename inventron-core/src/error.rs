//! Error types for Inventron operations

use std::collections::BTreeMap;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Unique constraint {constraint} violated by value '{value}'")]
    UniqueViolation { constraint: String, value: String },

    #[error("Storage backend failure: {reason}")]
    Backend { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Cache layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend failure: {reason}")]
    Backend { reason: String },

    #[error("Cache entry for key {key} could not be (de)serialized: {reason}")]
    Serialization { key: String, reason: String },
}

/// A single field-level validation failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },
}

impl ValidationError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::RequiredFieldMissing {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the field (or constraint) this failure is attached to.
    pub fn field(&self) -> &str {
        match self {
            Self::RequiredFieldMissing { field } | Self::InvalidValue { field, .. } => field,
            Self::ConstraintViolation { constraint, .. } => constraint,
        }
    }

    /// Human readable message without the field prefix.
    pub fn reason(&self) -> String {
        match self {
            Self::RequiredFieldMissing { .. } => "This field is required.".to_string(),
            Self::InvalidValue { reason, .. } | Self::ConstraintViolation { reason, .. } => {
                reason.clone()
            }
        }
    }
}

/// All field failures collected from one validation pass.
#[derive(Debug, Clone, Default, Error, PartialEq, Eq)]
#[error("Validation failed for {} field(s)", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Group messages by field, the shape clients receive in error details.
    pub fn field_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            map.entry(error.field().to_string())
                .or_default()
                .push(error.reason());
        }
        map
    }

    /// `Ok(value)` when nothing was collected, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Inventron errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InventronError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<ValidationError> for InventronError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error.into())
    }
}

/// Result type for Inventron operations.
pub type InventronResult<T> = Result<T, InventronError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::UniqueViolation {
            constraint: "inventory_items_item_name_key".to_string(),
            value: "Widget".to_string(),
        };
        assert!(err.to_string().contains("Widget"));

        assert_eq!(StorageError::LockPoisoned.to_string(), "Storage lock poisoned");
    }

    #[test]
    fn test_validation_field_map_groups_by_field() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::missing("item_name"));
        errors.push(ValidationError::invalid("item_quantity", "Must be >= 0."));
        errors.push(ValidationError::invalid("item_quantity", "Too large."));

        let map = errors.field_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["item_name"], vec!["This field is required.".to_string()]);
        assert_eq!(map["item_quantity"].len(), 2);
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(7), Ok(7));
        let errors: ValidationErrors = ValidationError::missing("x").into();
        assert!(errors.into_result(7).is_err());
    }

    #[test]
    fn test_inventron_error_from_variants() {
        let err: InventronError = StorageError::LockPoisoned.into();
        assert!(matches!(err, InventronError::Storage(_)));

        let err: InventronError = ValidationError::missing("item_name").into();
        assert!(err.to_string().contains("1 field(s)"));

        let err: InventronError = ConfigError::MissingRequired {
            field: "INVENTRON_JWT_SECRET".to_string(),
        }
        .into();
        assert!(err.to_string().contains("INVENTRON_JWT_SECRET"));
    }
}
