//! # Domain Types
//!
//! Core domain types used throughout the catalog.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────────────┐       ┌──────────────────────────┐   │
//! │  │  Product (aggregate root)    │       │  InventoryTransaction    │   │
//! │  │  ──────────────────────────  │       │  ──────────────────────  │   │
//! │  │  id (UUID)                   │◄──────│  product_id (back-ref)   │   │
//! │  │  store_id                    │       │  quantity (signed)       │   │
//! │  │  display_order               │       │  transaction_type        │   │
//! │  │  ProductPrivate (msrp, ...)  │       └──────────────────────────┘   │
//! │  │                              │                                      │
//! │  │  owns ─┬─ Vec<ProductImage>  │       ┌──────────────────────────┐   │
//! │  │        ├─ Vec<SizeVariant>   │       │  StoreSummary            │   │
//! │  │        └─ Vec<ColorVariant>  │       │  (external directory)    │   │
//! │  └──────────────────────────────┘       └──────────────────────────┘   │
//! │                                                                         │
//! │  Projections: PublicProduct (private fields stripped)                  │
//! │               ProductWithStore (PublicProduct + StoreSummary)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership vs. Back-Reference
//! Child rows (images, variants) live and die with their product. Inventory
//! transactions only point at a product; they are never created or removed
//! as a side effect of a product write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::DEFAULT_QUANTITY_UNIT;

// =============================================================================
// Product Type
// =============================================================================

/// Discriminates ordinary catalog items from public "posts".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    /// Regular merchandise shown in the store catalog.
    #[default]
    Item,
    /// Public post surfaced in the postcode feed.
    Post,
}

// =============================================================================
// Child Rows
// =============================================================================

/// Image reference owned by a product.
///
/// `image` holds the reference returned by the image store, never raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductImage {
    /// Database-assigned id. Ignored on write.
    #[serde(default)]
    pub id: i64,
    /// Owning product. Overwritten on write.
    #[serde(default)]
    pub product_id: String,
    pub image: String,
}

impl ProductImage {
    /// Creates an unsaved image row for the given reference.
    pub fn new(image: impl Into<String>) -> Self {
        ProductImage {
            id: 0,
            product_id: String::new(),
            image: image.into(),
        }
    }
}

/// Size option for a product (e.g. "M", "1kg").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SizeVariant {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub product_id: String,
    pub size: String,
    pub price: i64,
    pub quantity: i64,
}

impl SizeVariant {
    pub fn new(size: impl Into<String>, price: i64, quantity: i64) -> Self {
        SizeVariant {
            id: 0,
            product_id: String::new(),
            size: size.into(),
            price,
            quantity,
        }
    }
}

/// Color option for a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ColorVariant {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub product_id: String,
    pub color: String,
    pub price: i64,
    pub quantity: i64,
}

impl ColorVariant {
    pub fn new(color: impl Into<String>, price: i64, quantity: i64) -> Self {
        ColorVariant {
            id: 0,
            product_id: String::new(),
            color: color.into(),
            price,
            quantity,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// Store-private part of a product.
///
/// `msrp`, `critical_quantity` and `custom_code` never leave the store owner's
/// view; see [`PublicProduct`]. `quantity` is the directly stored counter
/// (legacy model) and is replaced by the ledger sum on ledger-aware reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPrivate {
    /// Suggested retail price.
    #[serde(default)]
    pub msrp: i64,
    #[serde(default)]
    pub quantity: i64,
    /// Stock level at which the store wants a low-stock warning.
    #[serde(default)]
    pub critical_quantity: i64,
    #[serde(default)]
    pub custom_code: String,
}

/// A product aggregate: scalar fields plus owned child collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4), assigned on create.
    #[serde(default)]
    pub id: String,

    /// Store that owns this product and scopes its display order.
    pub store_id: String,

    #[ts(as = "String")]
    #[serde(default)]
    pub created_at: DateTime<Utc>,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Unit label ("Piece", "kg", ...).
    #[serde(default)]
    pub quantity_unit: String,

    /// List price.
    #[serde(default)]
    pub mrp: i64,

    #[serde(default)]
    pub discount_price: i64,

    #[serde(default)]
    pub images: Vec<ProductImage>,

    #[serde(default)]
    pub brand: String,

    #[serde(default)]
    pub barcode: String,

    #[serde(default)]
    pub category: String,

    /// Position in the store's catalog, `1..=N`. Zero on input means "append".
    #[serde(default)]
    pub display_order: i64,

    #[serde(default)]
    pub size_variants: Vec<SizeVariant>,

    #[serde(default)]
    pub color_variants: Vec<ColorVariant>,

    #[serde(rename = "type", default)]
    pub product_type: ProductType,

    #[serde(default)]
    pub meta_description: String,

    #[serde(default)]
    pub meta_tags: String,

    /// Dietary marker (e.g. "veg", "non-veg").
    #[serde(default)]
    pub veg_type: String,

    /// Number of servings.
    #[serde(default)]
    pub servings: i64,

    #[serde(default)]
    pub out_of_stock: bool,

    #[serde(flatten)]
    pub private: ProductPrivate,

    /// Ledger entries, attached only by store listings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inventory_transactions: Vec<InventoryTransaction>,
}

impl Product {
    /// Creates an unsaved product with the given owner and name.
    ///
    /// ## Example
    /// ```rust
    /// use catalog_core::Product;
    ///
    /// let product = Product::new("store-1", "Masala Dosa");
    /// assert_eq!(product.quantity_unit, "Piece");
    /// assert_eq!(product.display_order, 0);
    /// ```
    pub fn new(store_id: impl Into<String>, name: impl Into<String>) -> Self {
        Product {
            store_id: store_id.into(),
            name: name.into(),
            quantity_unit: DEFAULT_QUANTITY_UNIT.to_string(),
            created_at: Utc::now(),
            ..Default::default()
        }
    }

    /// Reported stock quantity.
    #[inline]
    pub fn quantity(&self) -> i64 {
        self.private.quantity
    }

    /// Rewrites child back-references to this product's id and clears
    /// caller-supplied child ids.
    pub fn adopt_children(&mut self) {
        for image in &mut self.images {
            image.id = 0;
            image.product_id = self.id.clone();
        }
        for variant in &mut self.size_variants {
            variant.id = 0;
            variant.product_id = self.id.clone();
        }
        for variant in &mut self.color_variants {
            variant.id = 0;
            variant.product_id = self.id.clone();
        }
    }

    /// Returns the public projection of this product.
    pub fn public_view(&self) -> PublicProduct {
        PublicProduct::from(self.clone())
    }
}

// =============================================================================
// Public Projection
// =============================================================================

/// A product as seen by customers.
///
/// Built only from [`Product`]; `msrp`, `critical_quantity` and `custom_code`
/// have no field here, so they cannot be serialized by accident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PublicProduct {
    pub id: String,
    pub store_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub description: String,
    pub quantity_unit: String,
    pub mrp: i64,
    pub discount_price: i64,
    pub images: Vec<ProductImage>,
    pub brand: String,
    pub barcode: String,
    pub category: String,
    pub display_order: i64,
    pub size_variants: Vec<SizeVariant>,
    pub color_variants: Vec<ColorVariant>,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub meta_description: String,
    pub meta_tags: String,
    pub veg_type: String,
    pub servings: i64,
    pub out_of_stock: bool,
    pub quantity: i64,
}

impl From<Product> for PublicProduct {
    fn from(p: Product) -> Self {
        PublicProduct {
            id: p.id,
            store_id: p.store_id,
            created_at: p.created_at,
            name: p.name,
            description: p.description,
            quantity_unit: p.quantity_unit,
            mrp: p.mrp,
            discount_price: p.discount_price,
            images: p.images,
            brand: p.brand,
            barcode: p.barcode,
            category: p.category,
            display_order: p.display_order,
            size_variants: p.size_variants,
            color_variants: p.color_variants,
            product_type: p.product_type,
            meta_description: p.meta_description,
            meta_tags: p.meta_tags,
            veg_type: p.veg_type,
            servings: p.servings,
            out_of_stock: p.out_of_stock,
            quantity: p.private.quantity,
        }
    }
}

// =============================================================================
// Store Directory Projection
// =============================================================================

/// The subset of an external store record shown next to a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StoreSummary {
    /// Serialized as `storee_id`; the flattened product already carries
    /// `store_id`.
    #[serde(rename = "storee_id")]
    pub store_id: String,
    pub store_name: String,
    pub store_image: String,
    pub store_address: String,
    pub store_category: String,
    pub store_sub_category: String,
    pub store_description: String,
    pub store_rating: f64,
    pub store_review_count: i64,
}

/// A public post joined with its store's summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductWithStore {
    #[serde(flatten)]
    pub product: PublicProduct,
    #[serde(flatten)]
    pub store: StoreSummary,
}

// =============================================================================
// Display Order
// =============================================================================

/// One `(product, new order)` pair of a batch reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub product_id: String,
    pub display_order: i64,
}

impl OrderUpdate {
    pub fn new(product_id: impl Into<String>, display_order: i64) -> Self {
        OrderUpdate {
            product_id: product_id.into(),
            display_order,
        }
    }
}

// =============================================================================
// Inventory Ledger
// =============================================================================

/// Kind of an inventory movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Manual correction after a stock count.
    Adjustment,
    Purchase,
    Sale,
    Return,
}

/// An immutable inventory fact: a signed quantity delta for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryTransaction {
    #[serde(default)]
    pub id: String,
    pub product_id: String,
    /// Signed delta: positive for purchases/returns, negative for sales.
    pub quantity: i64,
    /// Unit price at the time of the transaction.
    pub price: i64,
    pub transaction_type: TransactionKind,
    #[serde(default)]
    pub description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InventoryTransaction {
    /// Creates an unsaved transaction; id and timestamp are assigned on append.
    pub fn new(
        product_id: impl Into<String>,
        quantity: i64,
        price: i64,
        transaction_type: TransactionKind,
    ) -> Self {
        InventoryTransaction {
            id: String::new(),
            product_id: product_id.into(),
            quantity,
            price,
            transaction_type,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Sets the free-text description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Sums the signed quantities of a ledger. An empty ledger folds to zero.
pub fn fold_quantity(ledger: &[InventoryTransaction]) -> i64 {
    ledger.iter().map(|t| t.quantity).sum()
}

// =============================================================================
// Quantity Model Integrity
// =============================================================================

/// A product whose ledger and directly stored quantity are both in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityConflict {
    pub product_id: String,
    pub stored_quantity: i64,
    pub ledger_quantity: i64,
    pub ledger_entries: i64,
}

impl QuantityConflict {
    /// Checks one product's quantity model.
    ///
    /// A product must use either the direct counter or the ledger. Having
    /// ledger entries and a non-zero stored counter at the same time means
    /// both were written.
    pub fn check(
        product_id: &str,
        stored_quantity: i64,
        ledger_quantity: i64,
        ledger_entries: i64,
    ) -> CoreResult<()> {
        if ledger_entries > 0 && stored_quantity != 0 {
            return Err(CoreError::MixedQuantityModels {
                product_id: product_id.to_string(),
                stored: stored_quantity,
                ledger: ledger_quantity,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_quantity_sums_signed_deltas() {
        let ledger = vec![
            InventoryTransaction::new("p", 10, 100, TransactionKind::Purchase),
            InventoryTransaction::new("p", -2, 150, TransactionKind::Sale),
            InventoryTransaction::new("p", 5, 100, TransactionKind::Return),
        ];
        assert_eq!(fold_quantity(&ledger), 13);
        assert_eq!(fold_quantity(&[]), 0);
    }

    #[test]
    fn test_public_view_hides_private_fields() {
        let mut product = Product::new("store-1", "Paneer Tikka");
        product.private = ProductPrivate {
            msrp: 999,
            quantity: 4,
            critical_quantity: 2,
            custom_code: "PT-01".to_string(),
        };

        let json = serde_json::to_value(product.public_view()).unwrap();
        assert!(json.get("msrp").is_none());
        assert!(json.get("critical_quantity").is_none());
        assert!(json.get("custom_code").is_none());
        assert_eq!(json["quantity"], 4);
    }

    #[test]
    fn test_private_fields_flatten_into_owner_json() {
        let mut product = Product::new("store-1", "Chai");
        product.private.msrp = 40;
        product.product_type = ProductType::Post;

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["msrp"], 40);
        assert_eq!(json["type"], "post");
        assert!(json.get("inventory_transactions").is_none());
    }

    #[test]
    fn test_product_with_store_json_round_trip() {
        let mut product = Product::new("s1", "Thali");
        product.product_type = ProductType::Post;
        let listing = ProductWithStore {
            product: product.public_view(),
            store: StoreSummary {
                store_id: "s1".to_string(),
                store_name: "Dosa Corner".to_string(),
                store_rating: 4.5,
                store_review_count: 120,
                ..Default::default()
            },
        };

        let json = serde_json::to_string(&listing).unwrap();
        assert_eq!(json.matches("\"store_id\"").count(), 1);
        assert_eq!(json.matches("\"storee_id\"").count(), 1);

        let back: ProductWithStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, listing);
    }

    #[test]
    fn test_adopt_children_rewrites_back_references() {
        let mut product = Product::new("store-1", "Shirt");
        product.id = "p-1".to_string();
        product.images = vec![ProductImage {
            id: 77,
            product_id: "other".to_string(),
            image: "https://img/1".to_string(),
        }];
        product.size_variants = vec![SizeVariant::new("M", 500, 3)];
        product.color_variants = vec![ColorVariant::new("Red", 500, 1)];

        product.adopt_children();

        assert_eq!(product.images[0].id, 0);
        assert_eq!(product.images[0].product_id, "p-1");
        assert_eq!(product.size_variants[0].product_id, "p-1");
        assert_eq!(product.color_variants[0].product_id, "p-1");
    }

    #[test]
    fn test_transaction_kind_wire_format() {
        let json = serde_json::to_string(&TransactionKind::Adjustment).unwrap();
        assert_eq!(json, "\"ADJUSTMENT\"");
        let kind: TransactionKind = serde_json::from_str("\"RETURN\"").unwrap();
        assert_eq!(kind, TransactionKind::Return);
    }

    #[test]
    fn test_quantity_conflict_check() {
        assert!(QuantityConflict::check("p", 0, 13, 3).is_ok());
        assert!(QuantityConflict::check("p", 7, 0, 0).is_ok());
        assert!(matches!(
            QuantityConflict::check("p", 7, 13, 3),
            Err(CoreError::MixedQuantityModels { stored: 7, ledger: 13, .. })
        ));
    }
}
