//! Barcode lookup across two nutrition databases.
//!
//! USDA FoodData Central is the primary source; OpenFoodFacts supplements it
//! with images and covers products USDA does not know. Both are queried at
//! once and their answers reconciled into a single [`FoodRecord`].

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DataSource, FoodRecord, SourceFoodRecord};

/// Relative difference under which two providers are considered to agree.
pub const CONSISTENCY_TOLERANCE: f64 = 0.10;

/// A nutrition database that can be queried by barcode.
///
/// The CLI implements this with reqwest; tests use in-memory fakes.
#[async_trait]
pub trait NutritionProvider: Send + Sync {
    /// `Ok(None)` when the provider has no product for the barcode.
    async fn lookup_barcode(&self, barcode: &str) -> Result<Option<SourceFoodRecord>>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("Product {barcode} not found in USDA or OpenFoodFacts")]
    NotFound { barcode: String },
}

/// The trimmed barcode if it is a non-empty run of ASCII digits.
#[must_use]
pub fn valid_barcode(raw: &str) -> Option<&str> {
    let barcode = raw.trim();
    (!barcode.is_empty() && barcode.bytes().all(|b| b.is_ascii_digit())).then_some(barcode)
}

/// Look up `barcode` in both providers concurrently and reconcile the answers.
///
/// A provider that errors counts the same as one that has no product; only
/// when neither has it does the scan fail.
pub async fn scan_barcode(
    usda: &dyn NutritionProvider,
    off: &dyn NutritionProvider,
    barcode: &str,
) -> Result<FoodRecord, ScanError> {
    let (usda_result, off_result) =
        tokio::join!(usda.lookup_barcode(barcode), off.lookup_barcode(barcode));

    let usda_record = settle("usda", barcode, usda_result);
    let off_record = settle("openfoodfacts", barcode, off_result);

    let record = resolve(barcode, usda_record, off_record)?;
    tracing::info!(
        barcode,
        source = record.source.label(),
        name = %record.name,
        "barcode scan resolved"
    );
    Ok(record)
}

fn settle(
    provider: &'static str,
    barcode: &str,
    result: Result<Option<SourceFoodRecord>>,
) -> Option<SourceFoodRecord> {
    match result {
        Ok(Some(record)) => {
            tracing::debug!(provider, barcode, name = %record.name, "provider found product");
            Some(record)
        }
        Ok(None) => {
            tracing::debug!(provider, barcode, "provider has no product");
            None
        }
        Err(err) => {
            let error = format!("{err:#}");
            tracing::warn!(provider, barcode, %error, "provider lookup failed");
            None
        }
    }
}

/// Pick or merge the provider outcomes.
pub fn resolve(
    barcode: &str,
    usda: Option<SourceFoodRecord>,
    off: Option<SourceFoodRecord>,
) -> Result<FoodRecord, ScanError> {
    match (usda, off) {
        (Some(usda), Some(off)) => Ok(merge(usda, off)),
        (Some(usda), None) => Ok(FoodRecord::from_source(usda, DataSource::Usda)),
        (None, Some(off)) => Ok(FoodRecord::from_source(off, DataSource::OpenFoodFacts)),
        (None, None) => Err(ScanError::NotFound {
            barcode: barcode.to_string(),
        }),
    }
}

/// Whether two records agree on carbs, protein and fat.
///
/// Differences are relative to the USDA value, so a zero there can never be
/// consistent.
#[must_use]
pub fn is_consistent(usda: &SourceFoodRecord, off: &SourceFoodRecord) -> bool {
    [
        (usda.carbs_per_100g, off.carbs_per_100g),
        (usda.protein_per_100g, off.protein_per_100g),
        (usda.fat_per_100g, off.fat_per_100g),
    ]
    .into_iter()
    .all(|(a, b)| relative_diff(a, b).is_some_and(|d| d < CONSISTENCY_TOLERANCE))
}

fn relative_diff(a: f64, b: f64) -> Option<f64> {
    if a == 0.0 {
        return None;
    }
    Some((a - b).abs() / a)
}

/// Merge records from both providers.
///
/// Macros are averaged when the providers agree and taken from USDA when they
/// don't. The result is tagged dual-verified either way.
#[must_use]
pub fn merge(usda: SourceFoodRecord, off: SourceFoodRecord) -> FoodRecord {
    let consistent = is_consistent(&usda, &off);
    tracing::debug!(
        barcode = %usda.barcode,
        consistent,
        usda_carbs = usda.carbs_per_100g,
        off_carbs = off.carbs_per_100g,
        "merging provider records"
    );

    let pick = |a: f64, b: f64| if consistent { (a + b) / 2.0 } else { a };

    FoodRecord {
        calories_per_100g: pick(usda.calories_per_100g, off.calories_per_100g),
        carbs_per_100g: pick(usda.carbs_per_100g, off.carbs_per_100g),
        protein_per_100g: pick(usda.protein_per_100g, off.protein_per_100g),
        fat_per_100g: pick(usda.fat_per_100g, off.fat_per_100g),
        fiber_per_100g: usda.fiber_per_100g.or(off.fiber_per_100g),
        sugar_per_100g: usda.sugar_per_100g.or(off.sugar_per_100g),
        sodium_mg_per_100g: usda.sodium_mg_per_100g.or(off.sodium_mg_per_100g),
        glycemic_index: usda.glycemic_index.or(off.glycemic_index),
        brand: usda.brand.or(off.brand),
        image_url: off.image_url.or(usda.image_url),
        id: usda.id,
        barcode: usda.barcode,
        name: usda.name,
        serving_size_g: usda.serving_size_g,
        source: DataSource::DualVerified,
    }
}
