//! Error types for the persistence layer.

use thiserror::Error;

/// Errors produced while loading, querying, or mutating the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file or a backup file could not be read or written.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The database file or a backup file is not valid JSON.
    #[error("corrupt database file: {0}")]
    Json(#[from] serde_json::Error),

    /// A lookup by ID found nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An insert collided with an existing unique field.
    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    /// A domain rule rejected the operation (validation, stock, payment).
    #[error(transparent)]
    Core(#[from] kasa_core::CoreError),

    /// A named backup file does not exist or is outside the backup directory.
    #[error("backup not found: {0}")]
    BackupNotFound(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn duplicate(field: &'static str, value: impl Into<String>) -> Self {
        StoreError::Duplicate {
            field,
            value: value.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = StoreError::not_found("product", "p-123");
        assert_eq!(err.to_string(), "product not found: p-123");
    }

    #[test]
    fn core_errors_pass_through_transparently() {
        let err: StoreError = kasa_core::CoreError::InsufficientFunds {
            received_minor: 100,
            total_minor: 250,
        }
        .into();
        assert!(err.to_string().contains("insufficient"));
    }
}
