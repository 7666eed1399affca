//! # Product Repository
//!
//! The product aggregate: one `products` row plus its images, size variants
//! and color variants, always written together.
//!
//! ## Transaction Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Transaction per Operation                        │
//! │                                                                         │
//! │  create                         update                                 │
//! │  ──────                         ──────                                 │
//! │  BEGIN                          BEGIN                                  │
//! │  lock_store(store)              UPDATE products SET ... (NotFound?)    │
//! │  next_order(store)              DELETE children                        │
//! │  INSERT products                INSERT children                        │
//! │  INSERT children                COMMIT                                 │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  delete                         change_quantity                        │
//! │  ──────                         ───────────────                        │
//! │  BEGIN                          BEGIN                                  │
//! │  lock_store(owner)              UPDATE ... WHERE no ledger entries     │
//! │  SELECT store, order            classify a miss: NotFound or           │
//! │  DELETE children + product        QuantityModel                        │
//! │  close_gap(store, order)        COMMIT                                 │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transaction starts with a write, so SQLite hands out the write lock
//! before anything is read. Returning early drops the transaction, which
//! rolls it back.

use catalog_core::validation::{validate_new_product, validate_non_negative, validate_product_update};
use catalog_core::{
    Product, ProductPrivate, ProductType, QuantityConflict, ValidationError, DEFAULT_QUANTITY_UNIT,
};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::children;
use crate::repository::display_order::DisplayOrder;
use crate::repository::ledger::InventoryLedger;
use crate::repository::PRODUCT_COLUMNS;

/// Attempts a create makes before reporting `Conflict`.
pub const DEFAULT_ORDER_RETRY_LIMIT: u32 = 3;

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat `products` row, in `PRODUCT_COLUMNS` order.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: String,
    store_id: String,
    created_at: DateTime<Utc>,
    name: String,
    description: String,
    quantity_unit: String,
    mrp: i64,
    discount_price: i64,
    brand: String,
    barcode: String,
    category: String,
    display_order: i64,
    product_type: ProductType,
    meta_description: String,
    meta_tags: String,
    veg_type: String,
    servings: i64,
    out_of_stock: bool,
    msrp: i64,
    quantity: i64,
    critical_quantity: i64,
    custom_code: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            store_id: row.store_id,
            created_at: row.created_at,
            name: row.name,
            description: row.description,
            quantity_unit: row.quantity_unit,
            mrp: row.mrp,
            discount_price: row.discount_price,
            images: Vec::new(),
            brand: row.brand,
            barcode: row.barcode,
            category: row.category,
            display_order: row.display_order,
            size_variants: Vec::new(),
            color_variants: Vec::new(),
            product_type: row.product_type,
            meta_description: row.meta_description,
            meta_tags: row.meta_tags,
            veg_type: row.veg_type,
            servings: row.servings,
            out_of_stock: row.out_of_stock,
            private: ProductPrivate {
                msrp: row.msrp,
                quantity: row.quantity,
                critical_quantity: row.critical_quantity,
                custom_code: row.custom_code,
            },
            inventory_transactions: Vec::new(),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the product aggregate.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let created = repo.create(Product::new("store-1", "Masala Dosa")).await?;
/// assert_eq!(created.display_order, 1);
///
/// let listing = repo.get_by_store("store-1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    retry_limit: u32,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository {
            pool,
            retry_limit: DEFAULT_ORDER_RETRY_LIMIT,
        }
    }

    /// Sets how many attempts a create makes when the database is locked.
    pub fn with_retry_limit(mut self, attempts: u32) -> Self {
        self.retry_limit = attempts.max(1);
        self
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Creates a product with its child collections.
    ///
    /// ## What This Does
    /// 1. Validates the product (store id, name, prices, variant labels)
    /// 2. Assigns a fresh id and `created_at`
    /// 3. Takes the store lock and, when `display_order <= 0`, appends the
    ///    product at `MAX(order) + 1`; a positive order is stored as given
    /// 4. Inserts the product and its children, then commits
    ///
    /// A create that finds the database locked is retried up to the retry
    /// limit and then reported as `Conflict`.
    pub async fn create(&self, product: Product) -> DbResult<Product> {
        validate_new_product(&product)?;

        let mut product = product;
        product.id = Uuid::new_v4().to_string();
        product.created_at = Utc::now();
        product.inventory_transactions.clear();
        if product.quantity_unit.trim().is_empty() {
            product.quantity_unit = DEFAULT_QUANTITY_UNIT.to_string();
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_create(product.clone()).await {
                Err(err) if err.is_retryable() && attempt < self.retry_limit => {
                    warn!(
                        store_id = %product.store_id,
                        attempt,
                        error = %err,
                        "Display order assignment hit a locked database, retrying"
                    );
                }
                Err(err) if err.is_retryable() => {
                    warn!(store_id = %product.store_id, attempt, "Giving up on display order assignment");
                    return Err(DbError::Conflict {
                        store_id: product.store_id,
                        attempts: attempt,
                    });
                }
                result => return result,
            }
        }
    }

    async fn try_create(&self, mut product: Product) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;

        DisplayOrder::lock_store(&mut *tx, &product.store_id).await?;
        if product.display_order <= 0 {
            product.display_order = DisplayOrder::next_order(&mut *tx, &product.store_id).await?;
        }

        debug!(
            id = %product.id,
            store_id = %product.store_id,
            display_order = product.display_order,
            "Creating product"
        );

        sqlx::query(
            r#"
            INSERT INTO products (
                id, store_id, created_at, name, description, quantity_unit,
                mrp, discount_price, brand, barcode, category, display_order,
                product_type, meta_description, meta_tags, veg_type, servings,
                out_of_stock, msrp, quantity, critical_quantity, custom_code
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.store_id)
        .bind(product.created_at)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.quantity_unit)
        .bind(product.mrp)
        .bind(product.discount_price)
        .bind(&product.brand)
        .bind(&product.barcode)
        .bind(&product.category)
        .bind(product.display_order)
        .bind(product.product_type)
        .bind(&product.meta_description)
        .bind(&product.meta_tags)
        .bind(&product.veg_type)
        .bind(product.servings)
        .bind(product.out_of_stock)
        .bind(product.private.msrp)
        .bind(product.private.quantity)
        .bind(product.private.critical_quantity)
        .bind(&product.private.custom_code)
        .execute(&mut *tx)
        .await?;

        children::insert_children(&mut *tx, &mut product).await?;

        tx.commit().await?;
        Ok(product)
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Gets a product with all three child collections.
    ///
    /// When the product has ledger entries, the reported quantity is their
    /// sum. The entries themselves are not attached.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Product> {
        debug!(id = %id, "Loading product");

        let mut tx = self.pool.begin().await?;
        let mut product = Self::fetch_product(&mut *tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;
        InventoryLedger::apply_derived_quantities(&mut *tx, std::slice::from_mut(&mut product))
            .await?;
        tx.commit().await?;

        Ok(product)
    }

    /// Lists a store's products by `category`, then `display_order`.
    ///
    /// Children and ledgers are attached. Products with a non-empty ledger
    /// report the ledger sum as their quantity.
    pub async fn get_by_store(&self, store_id: &str) -> DbResult<Vec<Product>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.store_id = ?1 \
             ORDER BY p.category ASC, p.display_order ASC, p.rowid ASC"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(store_id)
            .fetch_all(&mut *tx)
            .await?;

        let mut products: Vec<Product> = rows.into_iter().map(Product::from).collect();
        children::attach_children(&mut *tx, &mut products).await?;
        let ledgers = InventoryLedger::ledgers_for_store(&mut *tx, store_id).await?;
        InventoryLedger::attach_ledgers(&mut products, ledgers);

        tx.commit().await?;

        debug!(store_id = %store_id, count = products.len(), "Loaded store products");
        Ok(products)
    }

    /// Loads one product row and its children on the caller's connection.
    pub(crate) async fn fetch_product(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => {
                let mut product = Product::from(row);
                children::load_children(conn, &mut product).await?;
                Ok(Some(product))
            }
            None => Ok(None),
        }
    }

    /// Number of products a store has.
    pub async fn count_for_store(&self, store_id: &str) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE store_id = ?1")
            .bind(store_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Overwrites a product's scalar fields and replaces its child collections.
    ///
    /// `id`, `store_id`, `created_at` and `display_order` keep their stored
    /// values. The stored quantity is only overwritten while the product has
    /// no ledger entries.
    pub async fn update(&self, product: Product) -> DbResult<Product> {
        validate_product_update(&product)?;
        debug!(id = %product.id, "Updating product");

        let mut product = product;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                quantity_unit = ?4,
                mrp = ?5,
                discount_price = ?6,
                brand = ?7,
                barcode = ?8,
                category = ?9,
                product_type = ?10,
                meta_description = ?11,
                meta_tags = ?12,
                veg_type = ?13,
                servings = ?14,
                out_of_stock = ?15,
                msrp = ?16,
                critical_quantity = ?17,
                custom_code = ?18,
                quantity = CASE
                    WHEN EXISTS (
                        SELECT 1 FROM inventory_transactions t WHERE t.product_id = products.id
                    ) THEN quantity
                    ELSE ?19
                END
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.quantity_unit)
        .bind(product.mrp)
        .bind(product.discount_price)
        .bind(&product.brand)
        .bind(&product.barcode)
        .bind(&product.category)
        .bind(product.product_type)
        .bind(&product.meta_description)
        .bind(&product.meta_tags)
        .bind(&product.veg_type)
        .bind(product.servings)
        .bind(product.out_of_stock)
        .bind(product.private.msrp)
        .bind(product.private.critical_quantity)
        .bind(&product.private.custom_code)
        .bind(product.private.quantity)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        children::replace_children(&mut *tx, &mut product).await?;

        let mut stored = Self::fetch_product(&mut *tx, &product.id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &product.id))?;
        InventoryLedger::apply_derived_quantities(&mut *tx, std::slice::from_mut(&mut stored))
            .await?;

        tx.commit().await?;
        Ok(stored)
    }

    /// Directly overwrites the stored quantity.
    ///
    /// ## Errors
    /// - `NotFound` if the product does not exist
    /// - `Validation(QuantityModel)` if the product already has ledger
    ///   entries; its quantity is then owned by the ledger
    pub async fn change_quantity(&self, id: &str, quantity: i64) -> DbResult<()> {
        validate_non_negative("quantity", quantity)?;
        debug!(id = %id, quantity, "Changing stored quantity");

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE products SET quantity = ?1
            WHERE id = ?2
              AND NOT EXISTS (SELECT 1 FROM inventory_transactions WHERE product_id = ?2)
            "#,
        )
        .bind(quantity)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(DbError::not_found("Product", id));
            }

            let (entries, _) = InventoryLedger::ledger_summary(&mut *tx, id).await?;
            return Err(ValidationError::QuantityModel {
                product_id: id.to_string(),
                entries,
            }
            .into());
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Deletes a product and its children, then closes the order gap it
    /// leaves in its store.
    ///
    /// Ledger entries of the product are kept.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let mut tx = self.pool.begin().await?;
        DisplayOrder::lock_store_of_product(&mut *tx, id).await?;

        let located: Option<(String, i64)> =
            sqlx::query_as("SELECT store_id, display_order FROM products WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (store_id, removed_order) = match located {
            Some(located) => located,
            None => return Err(DbError::not_found("Product", id)),
        };

        children::delete_children(&mut *tx, id).await?;
        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        DisplayOrder::close_gap(&mut *tx, &store_id, removed_order).await?;

        tx.commit().await?;
        debug!(id = %id, store_id = %store_id, removed_order, "Product deleted");
        Ok(())
    }

    // =========================================================================
    // Integrity
    // =========================================================================

    /// Lists the products of a store that use both quantity models at once:
    /// ledger entries plus a non-zero stored quantity.
    pub async fn quantity_conflicts(&self, store_id: &str) -> DbResult<Vec<QuantityConflict>> {
        let rows = sqlx::query_as::<_, (String, i64, i64, i64)>(
            r#"
            SELECT p.id, p.quantity, SUM(t.quantity), COUNT(t.id)
            FROM products p
            INNER JOIN inventory_transactions t ON t.product_id = p.id
            WHERE p.store_id = ?1
            GROUP BY p.id, p.quantity
            ORDER BY MIN(p.display_order)
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        let mut conflicts = Vec::new();
        for (product_id, stored_quantity, ledger_quantity, ledger_entries) in rows {
            if let Err(err) =
                QuantityConflict::check(&product_id, stored_quantity, ledger_quantity, ledger_entries)
            {
                warn!(store_id = %store_id, error = %err, "Quantity model conflict");
                conflicts.push(QuantityConflict {
                    product_id,
                    stored_quantity,
                    ledger_quantity,
                    ledger_entries,
                });
            }
        }
        Ok(conflicts)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
