//! # catalog-core: Pure Domain Types for the Storefront Catalog
//!
//! This crate holds the product aggregate, the inventory ledger types and the
//! validation rules shared by every other crate in the workspace.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Catalog Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Transport (HTTP / gRPC, not in this workspace)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │   catalog-service: image upload ─► transaction ─► publish      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ catalog-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌──────────────┐  ┌───────────┐               │   │
//! │  │   │   types   │  │    error     │  │ validation│               │   │
//! │  │   │  Product  │  │ CoreError    │  │  store id │               │   │
//! │  │   │  Variants │  │ Validation   │  │  orders   │               │   │
//! │  │   │  Ledger   │  │   Error      │  │  ledger   │               │   │
//! │  │   └───────────┘  └──────────────┘  └───────────┘               │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 catalog-db (SQLite persistence)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product aggregate, child rows, inventory transactions, projections
//! - [`error`] - Domain error types
//! - [`validation`] - Input and display-order validation
//!
//! ## Example Usage
//!
//! ```rust
//! use catalog_core::types::{InventoryTransaction, TransactionKind};
//! use catalog_core::types::fold_quantity;
//!
//! let ledger = vec![
//!     InventoryTransaction::new("p-1", 10, 500, TransactionKind::Purchase),
//!     InventoryTransaction::new("p-1", -2, 650, TransactionKind::Sale),
//! ];
//! assert_eq!(fold_quantity(&ledger), 8);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Unit label applied when a product is created without one.
pub const DEFAULT_QUANTITY_UNIT: &str = "Piece";

/// First value of every store's display-order sequence.
pub const FIRST_DISPLAY_ORDER: i64 = 1;

/// Maximum length of a product name.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of a size or color label on a variant.
pub const MAX_VARIANT_LABEL_LEN: usize = 50;
