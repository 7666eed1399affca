//! # Error Types
//!
//! Domain-specific error types for catalog-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  catalog-core errors (this file)                                       │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  catalog-db errors (separate crate)                                    │
//! │  └── DbError          - Persistence failures, NotFound, Conflict       │
//! │                                                                         │
//! │  catalog-service errors                                                │
//! │  └── ServiceError     - DbError + image store + configuration          │
//! │                                                                         │
//! │  Flow: ValidationError → DbError → ServiceError → transport layer      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule violations that are not tied to a single input field.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A product has ledger entries and a directly written quantity at once.
    ///
    /// ## When This Occurs
    /// - `change_quantity` was used before the first inventory transaction
    ///   was appended, leaving a stale stored counter next to the ledger
    #[error("Product {product_id} mixes quantity models: stored {stored}, ledger {ledger}")]
    MixedQuantityModels {
        product_id: String,
        stored: i64,
        ledger: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Raised before any database work starts, or inside a transaction that is
/// then rolled back.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// A store's display orders are not exactly `1..=N`.
    #[error("display orders for store {store_id} are not contiguous 1..={expected_len}: {orders:?}")]
    NotContiguous {
        store_id: String,
        expected_len: usize,
        orders: Vec<i64>,
    },

    /// The same product appears twice in one batch reorder.
    #[error("product {product_id} appears more than once in the batch")]
    DuplicateInBatch { product_id: String },

    /// Direct quantity write attempted on a ledger-tracked product.
    #[error("product {product_id} is ledger-tracked; quantity is derived from {entries} inventory transactions")]
    QuantityModel { product_id: String, entries: i64 },
}

impl ValidationError {
    /// Creates a Required error for the given field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("store_id");
        assert_eq!(err.to_string(), "store_id is required");

        let err = ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        };
        assert_eq!(err.to_string(), "name must be at most 200 characters");
    }

    #[test]
    fn test_not_contiguous_message_lists_orders() {
        let err = ValidationError::NotContiguous {
            store_id: "store-1".to_string(),
            expected_len: 3,
            orders: vec![1, 2, 2],
        };
        assert_eq!(
            err.to_string(),
            "display orders for store store-1 are not contiguous 1..=3: [1, 2, 2]"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("product_id").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
