//! # catalog-service: Boundary Composition for the Storefront Catalog
//!
//! Puts the image store and the event publisher around the database layer.
//!
//! ## Modules
//!
//! - [`config`] - Environment configuration
//! - [`images`] - Image store port and an in-memory implementation
//! - [`events`] - Event publisher port, `products` topic, implementations
//! - [`service`] - `CatalogService`, the write path with its side effects
//! - [`error`] - Service error type
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalog_service::{CatalogConfig, CatalogService, InMemoryImageStore};
//!
//! let config = CatalogConfig::load()?;
//! let service = CatalogService::from_config(&config, Arc::new(InMemoryImageStore::default())).await?;
//! let created = service.create_product(product, vec![jpeg_bytes]).await?;
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod images;
pub mod service;

pub use config::{CatalogConfig, ConfigError};
pub use error::{ServiceError, ServiceResult};
pub use events::{ChannelPublisher, EventPublisher, NoopPublisher, PublishError, PRODUCTS_TOPIC};
#[cfg(feature = "redis")]
pub use events::RedisPublisher;
pub use images::{ImageStore, ImageStoreError, InMemoryImageStore};
pub use service::CatalogService;

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=catalog_db=trace` - Show trace for the database layer only
/// - Default: INFO, DEBUG for catalog crates, WARN for sqlx
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,catalog=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
