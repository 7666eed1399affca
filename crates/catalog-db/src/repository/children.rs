//! # Child Collections
//!
//! Images, size variants and color variants of a product. Every helper runs
//! on the caller's connection so it joins the caller's transaction.
//!
//! ## Replace Semantics
//! ```text
//! update(product)
//!   │
//!   ├── DELETE FROM product_images  WHERE product_id = ?
//!   ├── DELETE FROM size_variants   WHERE product_id = ?
//!   ├── DELETE FROM color_variants  WHERE product_id = ?
//!   │
//!   └── INSERT each supplied row (ids assigned by SQLite)
//! ```
//! A collection is never merged: whatever the caller sends is the new set.

use std::collections::HashMap;

use catalog_core::{ColorVariant, Product, ProductImage, SizeVariant};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::DbResult;

/// Upper bound on bound ids per `IN (...)` list.
const MAX_IDS_PER_QUERY: usize = 500;

// =============================================================================
// Writes
// =============================================================================

/// Inserts every child row of `product`, rewriting back-references first.
///
/// Caller-supplied child ids are discarded; the assigned rowids are written
/// back into `product`.
pub(crate) async fn insert_children(
    conn: &mut SqliteConnection,
    product: &mut Product,
) -> DbResult<()> {
    product.adopt_children();

    for image in &mut product.images {
        let result = sqlx::query("INSERT INTO product_images (product_id, image) VALUES (?1, ?2)")
            .bind(&image.product_id)
            .bind(&image.image)
            .execute(&mut *conn)
            .await?;
        image.id = result.last_insert_rowid();
    }

    for variant in &mut product.size_variants {
        let result = sqlx::query(
            "INSERT INTO size_variants (product_id, size, price, quantity) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&variant.product_id)
        .bind(&variant.size)
        .bind(variant.price)
        .bind(variant.quantity)
        .execute(&mut *conn)
        .await?;
        variant.id = result.last_insert_rowid();
    }

    for variant in &mut product.color_variants {
        let result = sqlx::query(
            "INSERT INTO color_variants (product_id, color, price, quantity) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&variant.product_id)
        .bind(&variant.color)
        .bind(variant.price)
        .bind(variant.quantity)
        .execute(&mut *conn)
        .await?;
        variant.id = result.last_insert_rowid();
    }

    debug!(
        product_id = %product.id,
        images = product.images.len(),
        sizes = product.size_variants.len(),
        colors = product.color_variants.len(),
        "Inserted child rows"
    );
    Ok(())
}

/// Deletes every child row of a product. Returns the number of rows removed.
pub(crate) async fn delete_children(conn: &mut SqliteConnection, product_id: &str) -> DbResult<u64> {
    let mut removed = 0;
    for table in ["product_images", "size_variants", "color_variants"] {
        let sql = format!("DELETE FROM {table} WHERE product_id = ?1");
        removed += sqlx::query(&sql)
            .bind(product_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }
    Ok(removed)
}

/// Replaces all three collections of `product` with the ones it carries.
pub(crate) async fn replace_children(
    conn: &mut SqliteConnection,
    product: &mut Product,
) -> DbResult<()> {
    let removed = delete_children(conn, &product.id).await?;
    debug!(product_id = %product.id, removed, "Cleared child rows");
    insert_children(conn, product).await
}

// =============================================================================
// Reads
// =============================================================================

/// Loads the child collections of one product.
pub(crate) async fn load_children(conn: &mut SqliteConnection, product: &mut Product) -> DbResult<()> {
    attach_children(conn, std::slice::from_mut(product)).await
}

/// Loads the child collections of many products with one query per table.
pub(crate) async fn attach_children(
    conn: &mut SqliteConnection,
    products: &mut [Product],
) -> DbResult<()> {
    if products.is_empty() {
        return Ok(());
    }
    let ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();

    let mut images = group_by_product(
        fetch_for_products::<ProductImage>(
            conn,
            "SELECT id, product_id, image FROM product_images",
            &ids,
        )
        .await?,
        |row| &row.product_id,
    );
    let mut sizes = group_by_product(
        fetch_for_products::<SizeVariant>(
            conn,
            "SELECT id, product_id, size, price, quantity FROM size_variants",
            &ids,
        )
        .await?,
        |row| &row.product_id,
    );
    let mut colors = group_by_product(
        fetch_for_products::<ColorVariant>(
            conn,
            "SELECT id, product_id, color, price, quantity FROM color_variants",
            &ids,
        )
        .await?,
        |row| &row.product_id,
    );

    for product in products.iter_mut() {
        product.images = images.remove(&product.id).unwrap_or_default();
        product.size_variants = sizes.remove(&product.id).unwrap_or_default();
        product.color_variants = colors.remove(&product.id).unwrap_or_default();
    }
    Ok(())
}

/// Runs `select` restricted to `product_id IN (ids)`, in insertion order.
pub(crate) async fn fetch_for_products<T>(
    conn: &mut SqliteConnection,
    select: &str,
    ids: &[String],
) -> DbResult<Vec<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let mut rows = Vec::new();
    for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
        let mut builder = QueryBuilder::<Sqlite>::new(select);
        builder.push(" WHERE product_id IN (");
        let mut separated = builder.separated(", ");
        for id in chunk {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(") ORDER BY id");

        let mut batch = builder.build_query_as::<T>().fetch_all(&mut *conn).await?;
        rows.append(&mut batch);
    }
    Ok(rows)
}

/// Groups rows by their owning product, keeping row order within a group.
pub(crate) fn group_by_product<T>(
    rows: Vec<T>,
    product_id: impl Fn(&T) -> &String,
) -> HashMap<String, Vec<T>> {
    let mut grouped: HashMap<String, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(product_id(&row).clone()).or_default().push(row);
    }
    grouped
}
