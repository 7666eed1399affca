//! # Catalog Queries
//!
//! Customer-facing read paths. Everything returned here is a public
//! projection: `msrp`, `critical_quantity` and `custom_code` never leave
//! this module.
//!
//! ## Postcode Listing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    list_by_postcode("560001")                           │
//! │                                                                         │
//! │  products p ──INNER JOIN── stores s ON s.id = p.store_id               │
//! │       │                                                                 │
//! │       │  WHERE p.product_type = 'post' AND s.pincode = ?               │
//! │       │  ORDER BY p.created_at DESC                                    │
//! │       ▼                                                                 │
//! │  ProductWithStore { PublicProduct + images, StoreSummary }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use catalog_core::{Product, ProductWithStore, PublicProduct, StoreSummary};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::children;
use crate::repository::ledger::InventoryLedger;
use crate::repository::product::{ProductRepository, ProductRow};
use crate::repository::PRODUCT_COLUMNS;

/// One joined row of the postcode listing.
#[derive(Debug, sqlx::FromRow)]
struct ProductWithStoreRow {
    #[sqlx(flatten)]
    product: ProductRow,
    #[sqlx(flatten)]
    store: StoreSummary,
}

/// Read-only catalog queries.
#[derive(Debug, Clone)]
pub struct CatalogQueries {
    pool: SqlitePool,
}

impl CatalogQueries {
    /// Creates a new CatalogQueries.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogQueries { pool }
    }

    /// Lists public posts of every store in a postcode, newest first.
    ///
    /// Stores without posts contribute nothing; an unknown postcode yields
    /// an empty list.
    pub async fn list_by_postcode(&self, postcode: &str) -> DbResult<Vec<ProductWithStore>> {
        let mut tx = self.pool.begin().await?;

        // p.store_id doubles as StoreSummary::store_id.
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS},
                s.name AS store_name,
                s.image AS store_image,
                s.address AS store_address,
                s.category AS store_category,
                s.sub_category AS store_sub_category,
                s.description AS store_description,
                s.rating AS store_rating,
                s.review_count AS store_review_count
            FROM products p
            INNER JOIN stores s ON s.id = p.store_id
            WHERE p.product_type = 'post' AND s.pincode = ?1
            ORDER BY p.created_at DESC, p.rowid DESC
            "#
        );
        let rows = sqlx::query_as::<_, ProductWithStoreRow>(&sql)
            .bind(postcode)
            .fetch_all(&mut *tx)
            .await?;

        let (mut products, stores): (Vec<Product>, Vec<StoreSummary>) = rows
            .into_iter()
            .map(|row| (Product::from(row.product), row.store))
            .unzip();
        children::attach_children(&mut *tx, &mut products).await?;
        InventoryLedger::apply_derived_quantities(&mut *tx, &mut products).await?;

        tx.commit().await?;

        debug!(postcode = %postcode, count = products.len(), "Listed posts by postcode");
        Ok(products
            .into_iter()
            .zip(stores)
            .map(|(product, store)| ProductWithStore {
                product: PublicProduct::from(product),
                store,
            })
            .collect())
    }

    /// Gets the public projection of one product.
    pub async fn get_public(&self, id: &str) -> DbResult<PublicProduct> {
        let product = ProductRepository::new(self.pool.clone()).get_by_id(id).await?;
        Ok(PublicProduct::from(product))
    }

    /// Lists the public projections of a store's products, in catalog order.
    pub async fn list_public_for_store(&self, store_id: &str) -> DbResult<Vec<PublicProduct>> {
        let products = ProductRepository::new(self.pool.clone())
            .get_by_store(store_id)
            .await?;
        Ok(products.into_iter().map(PublicProduct::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::{Database, DbConfig};
    use catalog_core::{ProductImage, ProductType};

    async fn add_store(db: &Database, id: &str, name: &str, pincode: &str) {
        sqlx::query(
            "INSERT INTO stores (id, name, image, address, pincode, category, rating, review_count) \
             VALUES (?1, ?2, 'logo.png', '12 MG Road', ?3, 'restaurant', 4.5, 120)",
        )
        .bind(id)
        .bind(name)
        .bind(pincode)
        .execute(db.pool())
        .await
        .unwrap();
    }

    fn post(store_id: &str, name: &str) -> Product {
        let mut product = Product::new(store_id, name);
        product.product_type = ProductType::Post;
        product.images = vec![ProductImage::new(format!("https://img.example/{name}.jpg"))];
        product.private.msrp = 500;
        product.private.custom_code = "SECRET".to_string();
        product
    }

    #[tokio::test]
    async fn test_list_by_postcode_joins_and_orders() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        add_store(&db, "s1", "Dosa Corner", "560001").await;
        add_store(&db, "s2", "Chai Point", "560001").await;
        add_store(&db, "s3", "Far Away", "110001").await;

        let repo = db.products();
        repo.create(post("s1", "weekend-special")).await.unwrap();
        repo.create(Product::new("s1", "plain-item")).await.unwrap();
        repo.create(post("s2", "new-blend")).await.unwrap();
        repo.create(post("s3", "elsewhere")).await.unwrap();

        let listing = db.catalog().list_by_postcode("560001").await.unwrap();
        let names: Vec<&str> = listing.iter().map(|p| p.product.name.as_str()).collect();
        assert_eq!(names, vec!["new-blend", "weekend-special"]);

        let first = &listing[0];
        assert_eq!(first.store.store_id, "s2");
        assert_eq!(first.store.store_name, "Chai Point");
        assert_eq!(first.store.store_rating, 4.5);
        assert_eq!(first.store.store_review_count, 120);
        assert_eq!(first.product.images.len(), 1);
    }

    #[tokio::test]
    async fn test_list_by_postcode_hides_private_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        add_store(&db, "s1", "Dosa Corner", "560001").await;
        db.products().create(post("s1", "thali")).await.unwrap();

        let listing = db.catalog().list_by_postcode("560001").await.unwrap();
        let json = serde_json::to_value(&listing[0]).unwrap();
        assert!(json.get("msrp").is_none());
        assert!(json.get("custom_code").is_none());
        assert!(json.get("critical_quantity").is_none());
        assert_eq!(json["store_name"], "Dosa Corner");
        assert_eq!(json["storee_id"], "s1");
        assert_eq!(json["type"], "post");
    }

    #[tokio::test]
    async fn test_unknown_postcode_is_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.catalog().list_by_postcode("000000").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_public_reads() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let created = db.products().create(post("s1", "biryani")).await.unwrap();

        let public = db.catalog().get_public(&created.id).await.unwrap();
        assert_eq!(public.name, "biryani");
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("msrp").is_none());

        let listing = db.catalog().list_public_for_store("s1").await.unwrap();
        assert_eq!(listing, vec![public]);

        assert!(matches!(
            db.catalog().get_public("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
