//! # Inventory Ledger
//!
//! Append-only inventory transactions and the quantity derived from them.
//!
//! ## Quantity Models
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Ways to Track Stock                              │
//! │                                                                         │
//! │  Direct (legacy)             Ledger                                    │
//! │  ───────────────             ──────                                    │
//! │  products.quantity = 7       +10 PURCHASE                              │
//! │                              -2  SALE                                  │
//! │                              +5  RETURN                                │
//! │                              ─────────────                             │
//! │                              quantity = SUM = 13                       │
//! │                                                                         │
//! │  Once a product has any ledger entry, reads report the sum and         │
//! │  ProductRepository::change_quantity refuses direct writes.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Appending never writes `products.quantity`. Ledger rows carry no foreign
//! key and survive the deletion of their product.

use std::collections::HashMap;

use catalog_core::validation::{validate_transaction, validate_transaction_correction};
use catalog_core::{fold_quantity, InventoryTransaction, Product};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::children;

const TRANSACTION_COLUMNS: &str =
    "id, product_id, quantity, price, transaction_type, description, created_at";

/// Repository for inventory transactions.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    /// Creates a new InventoryLedger.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLedger { pool }
    }

    /// Returns a product's transactions, oldest first.
    ///
    /// An unknown product simply has an empty ledger.
    pub async fn transactions_for(&self, product_id: &str) -> DbResult<Vec<InventoryTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM inventory_transactions \
             WHERE product_id = ?1 ORDER BY created_at, rowid"
        );
        let transactions = sqlx::query_as::<_, InventoryTransaction>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(product_id = %product_id, count = transactions.len(), "Loaded ledger");
        Ok(transactions)
    }

    /// Sum of the signed quantities of a product's transactions; `0` when empty.
    pub async fn derived_quantity(&self, product_id: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        let (_, total) = Self::ledger_summary(&mut *conn, product_id).await?;
        Ok(total)
    }

    /// Appends a transaction to an existing product's ledger.
    ///
    /// Assigns a fresh id and timestamp. The existence check and the insert
    /// are one statement, so a concurrent product delete cannot slip between
    /// them.
    ///
    /// ## Errors
    /// - `Validation` if `product_id` is blank or `price` is negative
    /// - `NotFound` if the product does not exist
    pub async fn append(&self, transaction: InventoryTransaction) -> DbResult<InventoryTransaction> {
        validate_transaction(&transaction)?;

        let mut transaction = transaction;
        transaction.id = Uuid::new_v4().to_string();
        transaction.created_at = Utc::now();

        debug!(
            id = %transaction.id,
            product_id = %transaction.product_id,
            quantity = transaction.quantity,
            kind = ?transaction.transaction_type,
            "Appending inventory transaction"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO inventory_transactions (
                id, product_id, quantity, price, transaction_type, description, created_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7
            WHERE EXISTS (SELECT 1 FROM products WHERE id = ?2)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.product_id)
        .bind(transaction.quantity)
        .bind(transaction.price)
        .bind(transaction.transaction_type)
        .bind(&transaction.description)
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &transaction.product_id));
        }
        Ok(transaction)
    }

    /// Gets one transaction by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<InventoryTransaction> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM inventory_transactions WHERE id = ?1");
        sqlx::query_as::<_, InventoryTransaction>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("InventoryTransaction", id))
    }

    /// Corrects an existing transaction.
    ///
    /// Quantity, price, kind and description are overwritten; `product_id`
    /// and `created_at` keep their stored values.
    pub async fn update(&self, transaction: InventoryTransaction) -> DbResult<InventoryTransaction> {
        validate_transaction_correction(&transaction)?;
        debug!(id = %transaction.id, "Correcting inventory transaction");

        let sql = format!(
            "UPDATE inventory_transactions \
             SET quantity = ?2, price = ?3, transaction_type = ?4, description = ?5 \
             WHERE id = ?1 \
             RETURNING {TRANSACTION_COLUMNS}"
        );
        sqlx::query_as::<_, InventoryTransaction>(&sql)
            .bind(&transaction.id)
            .bind(transaction.quantity)
            .bind(transaction.price)
            .bind(transaction.transaction_type)
            .bind(&transaction.description)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("InventoryTransaction", &transaction.id))
    }

    /// Removes a transaction.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting inventory transaction");

        let result = sqlx::query("DELETE FROM inventory_transactions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryTransaction", id));
        }
        Ok(())
    }

    // =========================================================================
    // Transaction helpers
    // =========================================================================

    /// Returns `(entries, sum)` for one product's ledger.
    pub(crate) async fn ledger_summary(
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<(i64, i64)> {
        let summary = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*), COALESCE(SUM(quantity), 0)
            FROM inventory_transactions
            WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(summary)
    }

    /// Loads the ledgers of every product of a store, keyed by product id.
    pub(crate) async fn ledgers_for_store(
        conn: &mut SqliteConnection,
        store_id: &str,
    ) -> DbResult<HashMap<String, Vec<InventoryTransaction>>> {
        let rows = sqlx::query_as::<_, InventoryTransaction>(
            r#"
            SELECT t.id, t.product_id, t.quantity, t.price, t.transaction_type,
                   t.description, t.created_at
            FROM inventory_transactions t
            INNER JOIN products p ON p.id = t.product_id
            WHERE p.store_id = ?1
            ORDER BY t.created_at, t.rowid
            "#,
        )
        .bind(store_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(children::group_by_product(rows, |t| &t.product_id))
    }

    /// Replaces the stored quantity of every product that has ledger entries
    /// with its ledger sum. Transactions are not attached.
    pub(crate) async fn apply_derived_quantities(
        conn: &mut SqliteConnection,
        products: &mut [Product],
    ) -> DbResult<()> {
        if products.is_empty() {
            return Ok(());
        }
        let ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();
        let entries = children::fetch_for_products::<(String, i64)>(
            conn,
            "SELECT product_id, quantity FROM inventory_transactions",
            &ids,
        )
        .await?;

        let mut totals: HashMap<String, i64> = HashMap::new();
        for (product_id, quantity) in entries {
            *totals.entry(product_id).or_default() += quantity;
        }

        for product in products.iter_mut() {
            if let Some(total) = totals.get(&product.id) {
                product.private.quantity = *total;
            }
        }
        Ok(())
    }

    /// Attaches full ledgers and replaces the stored quantity with the ledger
    /// sum wherever a ledger exists.
    pub(crate) fn attach_ledgers(
        products: &mut [Product],
        mut ledgers: HashMap<String, Vec<InventoryTransaction>>,
    ) {
        for product in products.iter_mut() {
            if let Some(ledger) = ledgers.remove(&product.id) {
                product.private.quantity = fold_quantity(&ledger);
                product.inventory_transactions = ledger;
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use catalog_core::{TransactionKind, ValidationError};

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .create(Product::new("store-1", "Basmati Rice 5kg"))
            .await
            .unwrap();
        (db, product.id)
    }

    #[tokio::test]
    async fn test_ledger_sum() {
        let (db, product_id) = setup().await;
        let ledger = db.ledger();

        for (qty, kind) in [
            (10, TransactionKind::Purchase),
            (-2, TransactionKind::Sale),
            (5, TransactionKind::Return),
        ] {
            ledger
                .append(InventoryTransaction::new(&product_id, qty, 450, kind))
                .await
                .unwrap();
        }

        assert_eq!(ledger.derived_quantity(&product_id).await.unwrap(), 13);

        let history = ledger.transactions_for(&product_id).await.unwrap();
        let deltas: Vec<i64> = history.iter().map(|t| t.quantity).collect();
        assert_eq!(deltas, vec![10, -2, 5]);
    }

    #[tokio::test]
    async fn test_empty_ledger_is_zero() {
        let (db, product_id) = setup().await;
        assert_eq!(db.ledger().derived_quantity(&product_id).await.unwrap(), 0);
        assert!(db.ledger().transactions_for(&product_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_unknown_product() {
        let (db, _) = setup().await;
        let err = db
            .ledger()
            .append(InventoryTransaction::new("nope", 1, 10, TransactionKind::Purchase))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_append_requires_product_id() {
        let (db, _) = setup().await;
        let err = db
            .ledger()
            .append(InventoryTransaction::new("", 1, 10, TransactionKind::Purchase))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(ValidationError::Required { .. })));
    }

    #[tokio::test]
    async fn test_append_does_not_touch_stored_quantity() {
        let (db, product_id) = setup().await;
        db.ledger()
            .append(InventoryTransaction::new(&product_id, 4, 10, TransactionKind::Purchase))
            .await
            .unwrap();

        let stored: i64 = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
            .bind(&product_id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn test_update_corrects_entry() {
        let (db, product_id) = setup().await;
        let ledger = db.ledger();
        let original = ledger
            .append(
                InventoryTransaction::new(&product_id, 10, 100, TransactionKind::Purchase)
                    .with_description("invoice 42"),
            )
            .await
            .unwrap();

        let mut correction = original.clone();
        correction.quantity = 8;
        correction.transaction_type = TransactionKind::Adjustment;
        correction.product_id = "someone-else".to_string();

        let corrected = ledger.update(correction).await.unwrap();
        assert_eq!(corrected.quantity, 8);
        assert_eq!(corrected.transaction_type, TransactionKind::Adjustment);
        assert_eq!(corrected.product_id, product_id);
        assert_eq!(corrected.created_at, original.created_at);
        assert_eq!(ledger.derived_quantity(&product_id).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_correction_without_product_id() {
        let (db, product_id) = setup().await;
        let ledger = db.ledger();
        let entry = ledger
            .append(InventoryTransaction::new(&product_id, 4, 50, TransactionKind::Purchase))
            .await
            .unwrap();

        let mut correction = entry.clone();
        correction.product_id = String::new();
        correction.quantity = 6;
        let corrected = ledger.update(correction).await.unwrap();
        assert_eq!(corrected.product_id, product_id);
        assert_eq!(ledger.derived_quantity(&product_id).await.unwrap(), 6);

        let mut bad_price = entry;
        bad_price.price = -1;
        assert!(matches!(ledger.update(bad_price).await, Err(DbError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let (db, product_id) = setup().await;
        let ledger = db.ledger();
        let entry = ledger
            .append(InventoryTransaction::new(&product_id, 3, 10, TransactionKind::Purchase))
            .await
            .unwrap();

        assert_eq!(ledger.get_by_id(&entry.id).await.unwrap(), entry);

        ledger.delete(&entry.id).await.unwrap();
        assert!(matches!(
            ledger.get_by_id(&entry.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            ledger.delete(&entry.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_ledger_survives_product_delete() {
        let (db, product_id) = setup().await;
        db.ledger()
            .append(InventoryTransaction::new(&product_id, 6, 10, TransactionKind::Purchase))
            .await
            .unwrap();

        db.products().delete(&product_id).await.unwrap();
        assert_eq!(db.ledger().derived_quantity(&product_id).await.unwrap(), 6);
    }
}
