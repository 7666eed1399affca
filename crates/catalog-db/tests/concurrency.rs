//! Concurrent writers against a file-backed database.
//!
//! In-memory databases are limited to one connection, so these tests use a
//! temporary file and a real pool.

use std::time::Duration;

use catalog_core::{OrderUpdate, Product};
use catalog_db::{BatchOrderMode, Database, DbConfig};

async fn file_db(dir: &tempfile::TempDir) -> Database {
    let config = DbConfig::new(dir.path().join("catalog.db"))
        .max_connections(8)
        .busy_timeout(Duration::from_secs(10))
        .order_retry_limit(5);
    Database::new(config).await.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_keep_orders_contiguous() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;

    let mut handles = Vec::new();
    for i in 0..24 {
        let repo = db.products();
        handles.push(tokio::spawn(async move {
            repo.create(Product::new("busy-store", format!("item-{i}"))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let orders = db.display_order().orders_for_store("busy-store").await.unwrap();
    assert_eq!(orders, (1..=24).collect::<Vec<i64>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_and_deletes_keep_orders_contiguous() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;

    let mut doomed = Vec::new();
    for i in 0..10 {
        let created = db
            .products()
            .create(Product::new("churn", format!("old-{i}")))
            .await
            .unwrap();
        if i % 2 == 0 {
            doomed.push(created.id);
        }
    }

    let mut handles = Vec::new();
    for id in doomed {
        let repo = db.products();
        handles.push(tokio::spawn(async move { repo.delete(&id).await }));
    }
    for i in 0..5 {
        let repo = db.products();
        handles.push(tokio::spawn(async move {
            repo.create(Product::new("churn", format!("new-{i}")))
                .await
                .map(|_| ())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(db.products().count_for_store("churn").await.unwrap(), 10);
    assert!(db.display_order().is_contiguous("churn").await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stores_do_not_share_sequences() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;

    let mut handles = Vec::new();
    for i in 0..12 {
        let repo = db.products();
        let store = if i % 2 == 0 { "even" } else { "odd" };
        handles.push(tokio::spawn(async move {
            repo.create(Product::new(store, format!("p-{i}"))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for store in ["even", "odd"] {
        let orders = db.display_order().orders_for_store(store).await.unwrap();
        assert_eq!(orders, vec![1, 2, 3, 4, 5, 6]);
    }

    // A strict reorder of a consistent store is accepted as-is.
    let listing = db.products().get_by_store("odd").await.unwrap();
    let reversed: Vec<OrderUpdate> = listing
        .iter()
        .map(|p| OrderUpdate::new(&p.id, 7 - p.display_order))
        .collect();
    db.display_order()
        .batch_set_order(&reversed, BatchOrderMode::Strict)
        .await
        .unwrap();
    assert!(db.display_order().is_contiguous("odd").await.unwrap());
}
