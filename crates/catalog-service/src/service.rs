//! # Catalog Service
//!
//! Sequences the side effects around a product write.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create / update                                      │
//! │                                                                         │
//! │  1. upload new images ──► ImageStore           (before any SQL)        │
//! │         │ failure: nothing written                                      │
//! │         ▼                                                               │
//! │  2. ProductRepository::create / update          (one transaction)      │
//! │         │ failure: rolled back, nothing published                      │
//! │         ▼                                                               │
//! │  3. tokio::spawn(publish "products" / id / snapshot)                   │
//! │         │ failure: warn!, write stays committed                        │
//! │         ▼                                                               │
//! │  return stored aggregate                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use catalog_core::{
    InventoryTransaction, OrderUpdate, Product, ProductImage, ProductWithStore, PublicProduct,
};
use catalog_db::{BatchOrderMode, Database};
use tracing::{debug, info, warn};

use crate::config::CatalogConfig;
use crate::error::ServiceResult;
use crate::events::{product_snapshot, EventPublisher, NoopPublisher, PRODUCTS_TOPIC};
use crate::images::ImageStore;

/// Product catalog operations with image upload and event publication.
#[derive(Clone)]
pub struct CatalogService {
    db: Database,
    publisher: Arc<dyn EventPublisher>,
    images: Arc<dyn ImageStore>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").field("db", &self.db).finish_non_exhaustive()
    }
}

impl CatalogService {
    pub fn new(
        db: Database,
        publisher: Arc<dyn EventPublisher>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        CatalogService {
            db,
            publisher,
            images,
        }
    }

    /// Opens the database described by `config` and picks the publisher it
    /// asks for.
    pub async fn from_config(
        config: &CatalogConfig,
        images: Arc<dyn ImageStore>,
    ) -> ServiceResult<Self> {
        let db = Database::new(config.db_config()).await?;
        let publisher = publisher_for(config)?;
        info!(path = %config.database_path.display(), "Catalog service ready");
        Ok(CatalogService::new(db, publisher, images))
    }

    /// Underlying database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Uploads `uploads`, appends their references to `product.images` and
    /// creates the product.
    pub async fn create_product(
        &self,
        product: Product,
        uploads: Vec<Vec<u8>>,
    ) -> ServiceResult<Product> {
        let mut product = product;
        self.upload_images(&mut product, uploads).await?;

        let created = self.db.products().create(product).await?;
        info!(id = %created.id, store_id = %created.store_id, "Product created");

        self.publish_snapshot(&created);
        Ok(created)
    }

    /// Uploads `uploads`, appends their references to `product.images` and
    /// replaces the stored product.
    pub async fn update_product(
        &self,
        product: Product,
        uploads: Vec<Vec<u8>>,
    ) -> ServiceResult<Product> {
        let mut product = product;
        self.upload_images(&mut product, uploads).await?;

        let updated = self.db.products().update(product).await?;
        info!(id = %updated.id, "Product updated");

        self.publish_snapshot(&updated);
        Ok(updated)
    }

    pub async fn delete_product(&self, id: &str) -> ServiceResult<()> {
        self.db.products().delete(id).await?;
        info!(id = %id, "Product deleted");
        Ok(())
    }

    pub async fn reorder(&self, updates: &[OrderUpdate], mode: BatchOrderMode) -> ServiceResult<()> {
        self.db.display_order().batch_set_order(updates, mode).await?;
        Ok(())
    }

    pub async fn record_inventory(
        &self,
        transaction: InventoryTransaction,
    ) -> ServiceResult<InventoryTransaction> {
        Ok(self.db.ledger().append(transaction).await?)
    }

    pub async fn change_quantity(&self, id: &str, quantity: i64) -> ServiceResult<()> {
        self.db.products().change_quantity(id, quantity).await?;
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Owner view of one product.
    pub async fn get_product(&self, id: &str) -> ServiceResult<Product> {
        Ok(self.db.products().get_by_id(id).await?)
    }

    /// Owner view of a store's catalog.
    pub async fn store_products(&self, store_id: &str) -> ServiceResult<Vec<Product>> {
        Ok(self.db.products().get_by_store(store_id).await?)
    }

    pub async fn public_product(&self, id: &str) -> ServiceResult<PublicProduct> {
        Ok(self.db.catalog().get_public(id).await?)
    }

    pub async fn posts_near(&self, postcode: &str) -> ServiceResult<Vec<ProductWithStore>> {
        Ok(self.db.catalog().list_by_postcode(postcode).await?)
    }

    // =========================================================================
    // Side effects
    // =========================================================================

    async fn upload_images(&self, product: &mut Product, uploads: Vec<Vec<u8>>) -> ServiceResult<()> {
        if uploads.is_empty() {
            return Ok(());
        }
        debug!(count = uploads.len(), "Uploading product images");
        for bytes in uploads {
            let reference = self.images.upload(bytes).await?;
            product.images.push(ProductImage::new(reference));
        }
        Ok(())
    }

    /// Publishes the snapshot in the background. Never fails the caller.
    fn publish_snapshot(&self, product: &Product) {
        let payload = match product_snapshot(product) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(id = %product.id, error = %err, "Could not serialize product snapshot");
                return;
            }
        };
        let publisher = Arc::clone(&self.publisher);
        let key = product.id.clone();

        tokio::spawn(async move {
            if let Err(err) = publisher.publish(PRODUCTS_TOPIC, &key, payload).await {
                warn!(id = %key, topic = PRODUCTS_TOPIC, error = %err, "Product event not published");
            }
        });
    }
}

/// Publisher selected by the configuration.
fn publisher_for(config: &CatalogConfig) -> ServiceResult<Arc<dyn EventPublisher>> {
    match &config.redis_url {
        #[cfg(feature = "redis")]
        Some(url) => Ok(Arc::new(crate::events::RedisPublisher::new(url)?)),
        #[cfg(not(feature = "redis"))]
        Some(_) => Err(crate::config::ConfigError::Unsupported("CATALOG_REDIS_URL".to_string()).into()),
        None => Ok(Arc::new(NoopPublisher)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
