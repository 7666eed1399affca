//! # Validation Module
//!
//! Input validation for product writes, ledger appends and display orders.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (out of scope)                                     │
//! │  └── Request decoding                                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields (store id, name, product id)                      │
//! │  ├── Lengths and signs                                                 │
//! │  └── Display-order contiguity (strict batch reorder)                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── Foreign keys from child rows to products                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use catalog_core::validation::{is_contiguous, validate_new_product};
//! use catalog_core::Product;
//!
//! assert!(validate_new_product(&Product::new("store-1", "Idli")).is_ok());
//! assert!(validate_new_product(&Product::new("", "Idli")).is_err());
//! assert!(is_contiguous(&[3, 1, 2]));
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{InventoryTransaction, OrderUpdate, Product};
use crate::{FIRST_DISPLAY_ORDER, MAX_NAME_LEN, MAX_VARIANT_LABEL_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifiers
// =============================================================================

/// Validates that an identifier-like field is present.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

// =============================================================================
// Product
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a product before it is created.
///
/// ## Rules
/// - `store_id` is required (display order is scoped by it)
/// - name rules from [`validate_product_name`]
/// - prices and display order are not negative
/// - variant labels are present and short
pub fn validate_new_product(product: &Product) -> ValidationResult<()> {
    validate_required("store_id", &product.store_id)?;
    validate_product_fields(product)
}

/// Validates the mutable fields of a product before an update.
pub fn validate_product_update(product: &Product) -> ValidationResult<()> {
    validate_required("id", &product.id)?;
    validate_product_fields(product)
}

fn validate_product_fields(product: &Product) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_non_negative("mrp", product.mrp)?;
    validate_non_negative("discount_price", product.discount_price)?;
    validate_non_negative("display_order", product.display_order)?;

    for variant in &product.size_variants {
        validate_variant_label("size", &variant.size)?;
        validate_non_negative("size_variants.price", variant.price)?;
    }
    for variant in &product.color_variants {
        validate_variant_label("color", &variant.color)?;
        validate_non_negative("color_variants.price", variant.price)?;
    }
    for image in &product.images {
        validate_required("images.image", &image.image)?;
    }

    Ok(())
}

fn validate_variant_label(field: &str, label: &str) -> ValidationResult<()> {
    validate_required(field, label)?;
    if label.chars().count() > MAX_VARIANT_LABEL_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_VARIANT_LABEL_LEN,
        });
    }
    Ok(())
}

/// Validates that a numeric field is zero or positive.
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Inventory Ledger
// =============================================================================

/// Validates a transaction before it is appended.
///
/// The quantity is a signed delta, so only the product reference and the
/// unit price are checked.
pub fn validate_transaction(transaction: &InventoryTransaction) -> ValidationResult<()> {
    validate_required("product_id", &transaction.product_id)?;
    validate_transaction_correction(transaction)
}

/// Validates a correction to a stored transaction.
///
/// A correction never moves the entry to another product, so `product_id`
/// is not required.
pub fn validate_transaction_correction(transaction: &InventoryTransaction) -> ValidationResult<()> {
    validate_non_negative("price", transaction.price)
}

// =============================================================================
// Display Order
// =============================================================================

/// Validates the shape of a batch reorder request.
///
/// ## Rules
/// - every product id is present
/// - every order is positive
/// - no product appears twice
///
/// Whether the resulting sequence is a permutation is checked separately,
/// against the database, by strict batch mode.
pub fn validate_order_updates(updates: &[OrderUpdate]) -> ValidationResult<()> {
    let mut seen = HashSet::with_capacity(updates.len());

    for update in updates {
        validate_required("product_id", &update.product_id)?;
        if update.display_order < FIRST_DISPLAY_ORDER {
            return Err(ValidationError::MustBePositive {
                field: "display_order".to_string(),
            });
        }
        if !seen.insert(update.product_id.as_str()) {
            return Err(ValidationError::DuplicateInBatch {
                product_id: update.product_id.clone(),
            });
        }
    }

    Ok(())
}

/// Returns true when `orders` is exactly `{1, …, N}` in any order.
pub fn is_contiguous(orders: &[i64]) -> bool {
    let mut sorted = orders.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .zip(FIRST_DISPLAY_ORDER..)
        .all(|(order, expected)| *order == expected)
}

/// Validates that a store's orders form a gap-free sequence.
pub fn validate_contiguous(store_id: &str, orders: &[i64]) -> ValidationResult<()> {
    if is_contiguous(orders) {
        return Ok(());
    }
    let mut sorted = orders.to_vec();
    sorted.sort_unstable();
    Err(ValidationError::NotContiguous {
        store_id: store_id.to_string(),
        expected_len: orders.len(),
        orders: sorted,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SizeVariant, TransactionKind};

    #[test]
    fn test_new_product_requires_store() {
        let product = Product::new("  ", "Vada Pav");
        assert!(matches!(
            validate_new_product(&product),
            Err(ValidationError::Required { field }) if field == "store_id"
        ));
    }

    #[test]
    fn test_product_name_rules() {
        assert!(validate_product_name("Filter Coffee").is_ok());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_variant_label_required() {
        let mut product = Product::new("store-1", "T-Shirt");
        product.size_variants = vec![SizeVariant::new("", 100, 1)];
        assert!(validate_new_product(&product).is_err());
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut product = Product::new("store-1", "Samosa");
        product.mrp = -1;
        assert!(matches!(
            validate_new_product(&product),
            Err(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn test_transaction_allows_negative_delta() {
        let sale = InventoryTransaction::new("p-1", -3, 120, TransactionKind::Sale);
        assert!(validate_transaction(&sale).is_ok());

        let orphan = InventoryTransaction::new("", 3, 120, TransactionKind::Purchase);
        assert!(validate_transaction(&orphan).is_err());
        assert!(validate_transaction_correction(&orphan).is_ok());

        let negative = InventoryTransaction::new("", 3, -1, TransactionKind::Purchase);
        assert!(validate_transaction_correction(&negative).is_err());
    }

    #[test]
    fn test_order_updates_reject_duplicates_and_zero() {
        let dup = vec![OrderUpdate::new("a", 1), OrderUpdate::new("a", 2)];
        assert!(matches!(
            validate_order_updates(&dup),
            Err(ValidationError::DuplicateInBatch { .. })
        ));

        let zero = vec![OrderUpdate::new("a", 0)];
        assert!(validate_order_updates(&zero).is_err());

        let ok = vec![OrderUpdate::new("a", 2), OrderUpdate::new("b", 1)];
        assert!(validate_order_updates(&ok).is_ok());
    }

    #[test]
    fn test_is_contiguous() {
        assert!(is_contiguous(&[]));
        assert!(is_contiguous(&[1]));
        assert!(is_contiguous(&[2, 3, 1]));
        assert!(!is_contiguous(&[1, 3]));
        assert!(!is_contiguous(&[1, 1, 2]));
        assert!(!is_contiguous(&[0, 1, 2]));
    }

    #[test]
    fn test_validate_contiguous_reports_sorted_orders() {
        let err = validate_contiguous("s", &[4, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NotContiguous { expected_len: 3, ref orders, .. } if orders == &vec![1, 2, 4]
        ));
    }
}
