//! Filtering and field derivation for product variants.
//!
//! Variants are restricted to the staged product subset before anything
//! touches storage, then each surviving row gets a normalized image path, a
//! synthetic price and a fresh surrogate id. Randomness is injected so tests
//! can pin exact values.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::records::{ProductVariant, RawVariantRecord};

/// Path segment every stored `image_name` carries exactly once.
pub const IMAGE_PREFIX: &str = "images/products/";

/// Inclusive bounds for synthetic variant prices.
pub const PRICE_RANGE: RangeInclusive<i32> = 10..=150;

/// A raw variant whose product reference is known to be staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedVariant {
    pub product_id: String,
    pub color_id: Option<String>,
    pub image_name: String,
    pub size_id: Option<String>,
}

impl StagedVariant {
    /// Returns `None` when the row's product reference is absent, blank, or
    /// not in `staged`.
    fn from_raw(row: RawVariantRecord, staged: &HashSet<String>) -> Option<Self> {
        let product_id = row.product_id?.trim().to_owned();
        if product_id.is_empty() || !staged.contains(&product_id) {
            return None;
        }

        Some(Self {
            product_id,
            color_id: non_blank(row.color_id),
            image_name: row.image_name,
            size_id: non_blank(row.size_id),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Keeps only rows referencing a staged product, preserving input order.
///
/// Streaming: rows are inspected one at a time as the returned iterator is
/// driven. An empty `staged` set yields nothing.
pub fn filter_staged<'a, I>(
    rows: I,
    staged: &'a HashSet<String>,
) -> impl Iterator<Item = StagedVariant> + 'a
where
    I: IntoIterator<Item = RawVariantRecord>,
    I::IntoIter: 'a,
{
    rows.into_iter()
        .filter_map(move |row| StagedVariant::from_raw(row, staged))
}

/// Prepends `prefix` unless `image_name` already starts with it.
#[must_use]
pub fn normalize_image_name(image_name: &str, prefix: &str) -> String {
    if image_name.starts_with(prefix) {
        image_name.to_owned()
    } else {
        format!("{prefix}{image_name}")
    }
}

/// Draws a price uniformly from `range`.
///
/// # Panics
///
/// Panics if `range` is empty.
pub fn synthetic_price<R: Rng + ?Sized>(rng: &mut R, range: &RangeInclusive<i32>) -> i32 {
    rng.random_range(range.clone())
}

/// Mints a version-4 UUID from `rng`'s output.
pub fn uuid_from_rng<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    uuid::Builder::from_random_bytes(rng.random()).into_uuid()
}

/// Turns [`StagedVariant`]s into insertable [`ProductVariant`]s.
///
/// `R` drives price generation and `I` supplies surrogate ids, so a test can
/// inject a seeded generator or a fixed id sequence.
pub struct VariantDeriver<R, I> {
    rng: R,
    next_id: I,
    image_prefix: String,
    price_range: RangeInclusive<i32>,
}

impl VariantDeriver<StdRng, fn() -> Uuid> {
    /// OS-seeded prices and `Uuid::new_v4` ids. Used by the real import.
    #[must_use]
    pub fn from_os_rng() -> Self {
        VariantDeriver::new(StdRng::from_os_rng(), Uuid::new_v4 as fn() -> Uuid)
    }

    /// Fully deterministic deriver: prices and ids both come from `seed`.
    #[must_use]
    pub fn seeded(seed: u64) -> VariantDeriver<StdRng, impl FnMut() -> Uuid> {
        let mut id_rng = StdRng::seed_from_u64(seed.wrapping_add(1));
        VariantDeriver::new(StdRng::seed_from_u64(seed), move || {
            uuid_from_rng(&mut id_rng)
        })
    }
}

impl<R, I> VariantDeriver<R, I>
where
    R: Rng,
    I: FnMut() -> Uuid,
{
    pub fn new(rng: R, next_id: I) -> Self {
        Self {
            rng,
            next_id,
            image_prefix: IMAGE_PREFIX.to_owned(),
            price_range: PRICE_RANGE,
        }
    }

    #[must_use]
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_prefix = prefix.into();
        self
    }

    /// # Panics
    ///
    /// Panics if `range` is empty.
    #[must_use]
    pub fn with_price_range(mut self, range: RangeInclusive<i32>) -> Self {
        assert!(!range.is_empty(), "price range {range:?} is empty");
        self.price_range = range;
        self
    }

    pub fn derive(&mut self, staged: StagedVariant) -> ProductVariant {
        ProductVariant {
            id: (self.next_id)(),
            image_name: normalize_image_name(&staged.image_name, &self.image_prefix),
            price: synthetic_price(&mut self.rng, &self.price_range),
            product_id: staged.product_id,
            color_id: staged.color_id,
            size_id: staged.size_id,
        }
    }

    /// Lazily derives every row of `staged`.
    pub fn derive_all<'a, S>(&'a mut self, staged: S) -> impl Iterator<Item = ProductVariant> + 'a
    where
        S: IntoIterator<Item = StagedVariant>,
        S::IntoIter: 'a,
    {
        staged.into_iter().map(move |row| self.derive(row))
    }
}

#[cfg(test)]
#[path = "variants_test.rs"]
mod tests;
