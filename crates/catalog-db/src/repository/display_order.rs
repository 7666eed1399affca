//! # Display-Order Maintainer
//!
//! Keeps each store's products numbered `1..=N`.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Display Order Bookkeeping                            │
//! │                                                                         │
//! │  create  : lock_store ─► next_order = MAX(order) + 1 ─► INSERT         │
//! │                                                                         │
//! │            before            delete #2            after                 │
//! │  delete  : [1, 2, 3, 4]  ─────────────────►  [1, 2, 3]                 │
//! │            lock_store ─► DELETE ─► close_gap (order > 2 → order - 1)   │
//! │                                                                         │
//! │  batch   : all pairs in one transaction, rolled back on any failure    │
//! │            Strict mode: every touched store must end at {1..N}         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! SQLite allows one writer at a time. A deferred transaction that reads
//! `MAX(display_order)` before writing could see a stale maximum, so create
//! and delete write the store's `store_order_locks` row first. That write
//! takes the database write lock; a second writer waits for `busy_timeout`
//! and then reads the committed maximum.

use std::collections::BTreeSet;

use catalog_core::validation::{validate_contiguous, validate_order_updates};
use catalog_core::{OrderUpdate, FIRST_DISPLAY_ORDER};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// How a batch reorder treats the resulting sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchOrderMode {
    /// Apply the pairs as given. A caller that does not send a permutation
    /// leaves duplicates or gaps behind.
    #[default]
    Permissive,
    /// Apply the pairs, then require every touched store to be exactly
    /// `{1..N}`; otherwise roll back with `NotContiguous`.
    Strict,
}

/// Display-order maintainer for all stores.
#[derive(Debug, Clone)]
pub struct DisplayOrder {
    pool: SqlitePool,
}

impl DisplayOrder {
    /// Creates a new DisplayOrder handle.
    pub fn new(pool: SqlitePool) -> Self {
        DisplayOrder { pool }
    }

    // =========================================================================
    // Transaction helpers
    // =========================================================================

    /// Takes the per-store write lock on the caller's transaction.
    ///
    /// Must be the first statement of the transaction so no read snapshot
    /// is taken before the lock.
    pub async fn lock_store(conn: &mut SqliteConnection, store_id: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO store_order_locks (store_id, version) VALUES (?1, 1)
            ON CONFLICT (store_id) DO UPDATE SET version = version + 1
            "#,
        )
        .bind(store_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Takes the lock of whichever store owns `product_id`.
    ///
    /// Writes nothing when the product does not exist, but still opens the
    /// write transaction.
    pub(crate) async fn lock_store_of_product(
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO store_order_locks (store_id, version)
            SELECT store_id, 1 FROM products WHERE id = ?1
            ON CONFLICT (store_id) DO UPDATE SET version = version + 1
            "#,
        )
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Returns the order a new product of `store_id` should get.
    ///
    /// `1` for an empty store. Only meaningful on a transaction that holds
    /// the store lock and performs the insert.
    pub async fn next_order(conn: &mut SqliteConnection, store_id: &str) -> DbResult<i64> {
        let max: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(display_order), 0) FROM products WHERE store_id = ?1",
        )
        .bind(store_id)
        .fetch_one(&mut *conn)
        .await?;

        let next = (max + 1).max(FIRST_DISPLAY_ORDER);
        debug!(store_id = %store_id, next, "Computed next display order");
        Ok(next)
    }

    /// Shifts every product ranked after `removed_order` up by one.
    ///
    /// Returns the number of renumbered products.
    pub async fn close_gap(
        conn: &mut SqliteConnection,
        store_id: &str,
        removed_order: i64,
    ) -> DbResult<u64> {
        let shifted = sqlx::query(
            r#"
            UPDATE products
            SET display_order = display_order - 1
            WHERE store_id = ?1 AND display_order > ?2
            "#,
        )
        .bind(store_id)
        .bind(removed_order)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        debug!(store_id = %store_id, removed_order, shifted, "Closed display order gap");
        Ok(shifted)
    }

    async fn store_orders(conn: &mut SqliteConnection, store_id: &str) -> DbResult<Vec<i64>> {
        let orders = sqlx::query_scalar(
            "SELECT display_order FROM products WHERE store_id = ?1 ORDER BY display_order",
        )
        .bind(store_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(orders)
    }

    // =========================================================================
    // Standalone operations
    // =========================================================================

    /// Overwrites one product's order without touching any other product.
    ///
    /// Can leave duplicates or gaps; use [`batch_set_order`](Self::batch_set_order)
    /// with [`BatchOrderMode::Strict`] for a checked reorder.
    pub async fn set_order(&self, product_id: &str, display_order: i64) -> DbResult<()> {
        debug!(product_id = %product_id, display_order, "Setting display order");

        let result = sqlx::query("UPDATE products SET display_order = ?1 WHERE id = ?2")
            .bind(display_order)
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }
        Ok(())
    }

    /// Applies every `(product, order)` pair or none of them.
    ///
    /// ## Errors
    /// - `NotFound` for the first unknown product id; nothing is written
    /// - `Validation` for a malformed batch, or, in strict mode, for a store
    ///   whose resulting orders are not `{1..N}`; nothing is written
    pub async fn batch_set_order(
        &self,
        updates: &[OrderUpdate],
        mode: BatchOrderMode,
    ) -> DbResult<()> {
        if updates.is_empty() {
            return Ok(());
        }
        validate_order_updates(updates)?;

        debug!(count = updates.len(), mode = ?mode, "Applying batch display order");

        let mut tx = self.pool.begin().await?;
        let mut touched_stores = BTreeSet::new();

        for update in updates {
            let store_id: Option<String> = sqlx::query_scalar(
                "UPDATE products SET display_order = ?1 WHERE id = ?2 RETURNING store_id",
            )
            .bind(update.display_order)
            .bind(&update.product_id)
            .fetch_optional(&mut *tx)
            .await?;

            match store_id {
                Some(store_id) => {
                    touched_stores.insert(store_id);
                }
                // Dropping `tx` rolls back the pairs already applied.
                None => return Err(DbError::not_found("Product", &update.product_id)),
            }
        }

        if mode == BatchOrderMode::Strict {
            for store_id in &touched_stores {
                let orders = Self::store_orders(&mut *tx, store_id).await?;
                validate_contiguous(store_id, &orders)?;
            }
        }

        tx.commit().await?;
        debug!(stores = touched_stores.len(), "Batch display order committed");
        Ok(())
    }

    /// Returns a store's current orders, ascending.
    pub async fn orders_for_store(&self, store_id: &str) -> DbResult<Vec<i64>> {
        let mut conn = self.pool.acquire().await?;
        Self::store_orders(&mut *conn, store_id).await
    }

    /// Whether a store's current orders are exactly `{1..N}`.
    pub async fn is_contiguous(&self, store_id: &str) -> DbResult<bool> {
        let orders = self.orders_for_store(store_id).await?;
        Ok(catalog_core::validation::is_contiguous(&orders))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use catalog_core::{Product, ValidationError};

    async fn seeded(db: &Database, store_id: &str, names: &[&str]) -> Vec<String> {
        let mut ids = Vec::new();
        for name in names {
            let created = db.products().create(Product::new(store_id, *name)).await.unwrap();
            ids.push(created.id);
        }
        ids
    }

    #[tokio::test]
    async fn test_next_order_starts_at_one() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let next = DisplayOrder::next_order(&mut conn, "empty-store").await.unwrap();
        assert_eq!(next, 1);
    }

    #[tokio::test]
    async fn test_orders_are_per_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seeded(&db, "a", &["one", "two"]).await;
        seeded(&db, "b", &["uno"]).await;

        let orders = db.display_order();
        assert_eq!(orders.orders_for_store("a").await.unwrap(), vec![1, 2]);
        assert_eq!(orders.orders_for_store("b").await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_set_order_unknown_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.display_order().set_order("missing", 3).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_set_order_is_unchecked() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ids = seeded(&db, "s", &["a", "b"]).await;

        db.display_order().set_order(&ids[0], 2).await.unwrap();
        assert_eq!(db.display_order().orders_for_store("s").await.unwrap(), vec![2, 2]);
        assert!(!db.display_order().is_contiguous("s").await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_permutation_applies() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ids = seeded(&db, "s", &["a", "b", "c"]).await;

        let updates = vec![
            OrderUpdate::new(&ids[0], 3),
            OrderUpdate::new(&ids[1], 1),
            OrderUpdate::new(&ids[2], 2),
        ];
        db.display_order()
            .batch_set_order(&updates, BatchOrderMode::Strict)
            .await
            .unwrap();

        let c = db.products().get_by_id(&ids[2]).await.unwrap();
        assert_eq!(c.display_order, 2);
        assert!(db.display_order().is_contiguous("s").await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_unknown_id_rolls_back_everything() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ids = seeded(&db, "s", &["a", "b"]).await;

        let updates = vec![
            OrderUpdate::new(&ids[0], 2),
            OrderUpdate::new("ghost", 5),
            OrderUpdate::new(&ids[1], 1),
        ];
        let err = db
            .display_order()
            .batch_set_order(&updates, BatchOrderMode::Permissive)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref id, .. } if id == "ghost"));

        let a = db.products().get_by_id(&ids[0]).await.unwrap();
        let b = db.products().get_by_id(&ids[1]).await.unwrap();
        assert_eq!((a.display_order, b.display_order), (1, 2));
    }

    #[tokio::test]
    async fn test_strict_batch_rejects_gap() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ids = seeded(&db, "s", &["a", "b"]).await;

        let updates = vec![OrderUpdate::new(&ids[0], 3)];
        let err = db
            .display_order()
            .batch_set_order(&updates, BatchOrderMode::Strict)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::NotContiguous { .. })
        ));
        assert_eq!(db.display_order().orders_for_store("s").await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_permissive_batch_trusts_caller() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ids = seeded(&db, "s", &["a", "b"]).await;

        let updates = vec![OrderUpdate::new(&ids[0], 7)];
        db.display_order()
            .batch_set_order(&updates, BatchOrderMode::Permissive)
            .await
            .unwrap();
        assert_eq!(db.display_order().orders_for_store("s").await.unwrap(), vec![2, 7]);
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.display_order()
            .batch_set_order(&[], BatchOrderMode::Strict)
            .await
            .unwrap();
    }
}
