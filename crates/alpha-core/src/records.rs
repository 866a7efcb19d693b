//! Row shapes for the alpha CSV snapshots and the derived variant record.
//!
//! Reference records map one-to-one onto their CSV columns and are loaded
//! verbatim. Optional columns deserialize empty fields to `None` so they are
//! bound as SQL `NULL` rather than `""`.

use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Color {
    pub id: String,
    pub name: String,
    /// Hex code as published, e.g. `"#1A2B3C"`.
    pub hex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Size {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
}

/// A row of `product_variants.csv` as published. The source carries neither
/// a variant id nor a price.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawVariantRecord {
    pub product_id: Option<String>,
    pub color_id: Option<String>,
    #[serde(default)]
    pub image_name: String,
    pub size_id: Option<String>,
}

/// A variant ready for insertion into `product_variants`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: String,
    pub color_id: Option<String>,
    /// Always carries [`crate::IMAGE_PREFIX`] exactly once.
    pub image_name: String,
    pub size_id: Option<String>,
    /// Synthetic; the source dataset has no pricing.
    pub price: i32,
}
