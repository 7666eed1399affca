//! # Repository Module
//!
//! The four catalog components, each a thin handle over the pool.
//!
//! ## Component Graph
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Catalog Components                                   │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │                                                                 │
//! │       │  db.products().create(product)                                 │
//! │       ▼                                                                 │
//! │  ProductRepository (product.rs) ── one transaction per operation       │
//! │  ├── DisplayOrder::lock_store / next_order / close_gap                 │
//! │  ├── children::insert / replace / delete / attach                      │
//! │  └── InventoryLedger::ledgers_for_store (quantity derivation)          │
//! │       │                                                                 │
//! │       │  &mut SqliteConnection (the caller's transaction)              │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  CatalogQueries (catalog.rs) ── read-only, public projections          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Product aggregate CRUD
//! - [`DisplayOrder`] - Per-store ordering sequence
//! - [`InventoryLedger`] - Inventory transactions and derived quantity
//! - [`CatalogQueries`] - Public read paths and the postcode listing

pub mod catalog;
pub(crate) mod children;
pub mod display_order;
pub mod ledger;
pub mod product;

pub use catalog::CatalogQueries;
pub use display_order::{BatchOrderMode, DisplayOrder};
pub use ledger::InventoryLedger;
pub use product::ProductRepository;

/// Product columns in `ProductRow` order, qualified with the `p` alias.
pub(crate) const PRODUCT_COLUMNS: &str = "\
    p.id, p.store_id, p.created_at, p.name, p.description, p.quantity_unit, \
    p.mrp, p.discount_price, p.brand, p.barcode, p.category, p.display_order, \
    p.product_type, p.meta_description, p.meta_tags, p.veg_type, p.servings, \
    p.out_of_stock, p.msrp, p.quantity, p.critical_quantity, p.custom_code";
