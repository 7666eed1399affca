//! # Seed Data Generator
//!
//! Populates the catalog with stores, products, posts and ledger entries for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed 3 stores with 40 products each (default)
//! cargo run -p catalog-service --bin seed
//!
//! # Custom amount
//! cargo run -p catalog-service --bin seed -- --stores 5 --count 200
//!
//! # Specify database path (otherwise CATALOG_DB_PATH, then ./catalog.db)
//! cargo run -p catalog-service --bin seed -- --db ./data/catalog.db
//! ```
//!
//! ## Generated Data
//! - One `stores` row per store, all in postcode `560001`
//! - Products across food categories, appended in display order
//! - Every fifth product is a public post
//! - Every third product tracks stock through the ledger, the rest use the
//!   stored quantity

use std::env;
use std::sync::Arc;

use catalog_core::{
    ColorVariant, InventoryTransaction, Product, ProductType, SizeVariant, TransactionKind,
};
use catalog_service::{init_tracing, CatalogConfig, CatalogService, InMemoryImageStore};

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "breakfast",
        &["Masala Dosa", "Idli Sambar", "Poha", "Upma", "Aloo Paratha", "Medu Vada"],
    ),
    (
        "beverages",
        &["Filter Coffee", "Masala Chai", "Mango Lassi", "Buttermilk", "Lime Soda"],
    ),
    (
        "mains",
        &["Veg Biryani", "Paneer Butter Masala", "Dal Tadka", "Chole Bhature", "Rajma Rice"],
    ),
    (
        "desserts",
        &["Gulab Jamun", "Rasmalai", "Kulfi", "Payasam", "Jalebi"],
    ),
];

/// Portion sizes with a price addon
const SIZES: &[(&str, i64)] = &[("Regular", 0), ("Large", 40)];

const POSTCODE: &str = "560001";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config = CatalogConfig::load()?;
    let mut stores: usize = 3;
    let mut count: usize = 40;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--stores" | "-s" => {
                if i + 1 < args.len() {
                    stores = args[i + 1].parse().unwrap_or(stores);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Storefront Catalog Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --stores <N>   Number of stores (default: 3)");
                println!("  -c, --count <N>    Products per store (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: $CATALOG_DB_PATH or ./catalog.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Storefront Catalog Seed Data Generator");
    println!("======================================");
    println!("Database: {}", config.database_path.display());
    println!("Stores:   {}", stores);
    println!("Products: {} per store", count);
    println!();

    let service =
        CatalogService::from_config(&config, Arc::new(InMemoryImageStore::default())).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let start = std::time::Instant::now();
    let mut generated = 0;

    for store_idx in 0..stores {
        let store_id = format!("seed-store-{store_idx}");

        let existing = service.db().products().count_for_store(&store_id).await?;
        if existing > 0 {
            println!("⚠ {} already has {} products, skipping", store_id, existing);
            continue;
        }

        sqlx::query(
            "INSERT OR IGNORE INTO stores (id, name, address, pincode, category, rating, review_count) \
             VALUES (?1, ?2, ?3, ?4, 'restaurant', ?5, ?6)",
        )
        .bind(&store_id)
        .bind(format!("Seed Kitchen #{}", store_idx + 1))
        .bind(format!("{} MG Road", 10 + store_idx))
        .bind(POSTCODE)
        .bind(3.5 + (store_idx % 3) as f64 * 0.5)
        .bind((store_idx as i64 + 1) * 37)
        .execute(service.db().pool())
        .await?;

        for seed in 0..count {
            let product = generate_product(&store_id, seed);
            let created = match service.create_product(product, Vec::new()).await {
                Ok(created) => created,
                Err(e) => {
                    eprintln!("Failed to create product {} for {}: {}", seed, store_id, e);
                    continue;
                }
            };

            if seed % 3 == 0 {
                for (quantity, kind) in [
                    (20, TransactionKind::Purchase),
                    (-((seed % 7) as i64), TransactionKind::Sale),
                ] {
                    service
                        .record_inventory(InventoryTransaction::new(
                            &created.id,
                            quantity,
                            created.discount_price,
                            kind,
                        ))
                        .await?;
                }
            }
            generated += 1;
        }
        println!("  Seeded {}", store_id);
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let posts = service.posts_near(POSTCODE).await?;
    println!("  Posts in {}: {}", POSTCODE, posts.len());

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

/// Generates one product with realistic data.
fn generate_product(store_id: &str, seed: usize) -> Product {
    let (category, names) = CATEGORIES[seed % CATEGORIES.len()];
    let name = names[(seed / CATEGORIES.len()) % names.len()];
    let (size, addon) = SIZES[seed % SIZES.len()];

    let mrp = 60 + ((seed * 17) % 240) as i64;

    let mut product = Product::new(store_id, format!("{name} ({size})"));
    product.category = category.to_string();
    product.description = format!("House-made {}", name.to_lowercase());
    product.mrp = mrp + addon;
    product.discount_price = mrp + addon - (seed % 4) as i64 * 5;
    product.barcode = format!("890{:010}", seed);
    product.veg_type = if category == "mains" && seed % 2 == 1 { "non-veg" } else { "veg" }.to_string();
    product.servings = 1 + (seed % 3) as i64;
    product.size_variants = SIZES
        .iter()
        .map(|(label, extra)| SizeVariant::new(*label, mrp + extra, 10))
        .collect();
    if category == "beverages" {
        product.color_variants = vec![ColorVariant::new("Classic", mrp, 10)];
    }
    if seed % 5 == 0 {
        product.product_type = ProductType::Post;
        product.meta_description = format!("Today's special: {name}");
        product.meta_tags = format!("{category},special");
    }

    // Ledger-tracked products keep the stored counter at zero.
    if seed % 3 != 0 {
        product.private.quantity = 25 + (seed % 10) as i64;
    }
    product.private.msrp = product.mrp + 20;
    product.private.critical_quantity = 5;
    product.private.custom_code = format!("SEED-{:04}", seed);
    product
}
