//! # catalog-db: Database Layer for the Storefront Catalog
//!
//! This crate owns every SQL statement and every transaction of the catalog.
//! It uses SQLite through sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Catalog Data Flow                        │
//! │                                                                         │
//! │  catalog-service (upload ─► write ─► publish)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    catalog-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │    Repositories    │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded) │  │   │
//! │  │   │               │    │ ProductRepository  │  │            │  │   │
//! │  │   │ SqlitePool    │◄───│ DisplayOrder       │  │ 001 schema │  │   │
//! │  │   │ WAL, FKs on   │    │ InventoryLedger    │  │ 002 ledger │  │   │
//! │  │   │ busy_timeout  │    │ CatalogQueries     │  │ 003 stores │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - The catalog components
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalog_db::{Database, DbConfig};
//! use catalog_core::Product;
//!
//! let db = Database::new(DbConfig::new("path/to/catalog.db")).await?;
//!
//! let created = db.products().create(Product::new("store-1", "Idli")).await?;
//! let posts = db.catalog().list_by_postcode("560001").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ErrorKind};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{BatchOrderMode, CatalogQueries, DisplayOrder, InventoryLedger, ProductRepository};
