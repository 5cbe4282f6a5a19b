use thiserror::Error;

/// Canonical error type for catalog and ranking operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity was not found in the catalog store.
    #[error("{entity} `{id}` was not found")]
    NotFound {
        /// Entity type name (e.g. `"book"`).
        entity: &'static str,
        /// Identifier of the missing entity.
        id: String,
    },

    /// Entity already exists and cannot be created again.
    #[error("{entity} `{id}` already exists")]
    AlreadyExists {
        /// Entity type name (e.g. `"book"`).
        entity: &'static str,
        /// Identifier that conflicts.
        id: String,
    },

    /// A ranking step referenced a derived aggregate column that was never attached.
    #[error("derived column `{column}` is not attached to this query")]
    MissingAggregate {
        /// Name of the absent derived column.
        column: &'static str,
    },

    /// Validation error for input data.
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable explanation of the rejected input.
        message: String,
    },

    /// Storage backend error.
    #[error("storage error: {message}")]
    Storage {
        /// Backend failure details.
        message: String,
    },

    /// Unexpected internal error occurred.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable details for debugging purposes.
        message: String,
    },
}

impl CoreError {
    /// Creates a `NotFound` variant.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates an `AlreadyExists` variant.
    #[must_use]
    pub fn already_exists(entity: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity,
            id: id.into(),
        }
    }

    /// Creates a `MissingAggregate` variant.
    #[must_use]
    pub fn missing_aggregate(column: &'static str) -> Self {
        Self::MissingAggregate { column }
    }

    /// Creates a `Validation` variant.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a `Storage` variant.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates an `Internal` variant.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Convenient result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
