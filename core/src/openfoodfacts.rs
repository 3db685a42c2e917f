use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::models::SourceFoodRecord;

pub const UNKNOWN_PRODUCT: &str = "Unknown Product";
pub const DEFAULT_SERVING_G: f64 = 100.0;

static GRAMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+\.?\d*)\s*(?:grams?|gr|g)\b").expect("valid grams pattern")
});
static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.?\d*").expect("valid number pattern"));

#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    pub status: i32,
    #[serde(default)]
    pub product: Option<ProductData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductData {
    pub product_name: Option<String>,
    pub brands: Option<String>,
    pub image_url: Option<String>,
    pub image_front_url: Option<String>,
    pub serving_size: Option<String>,
    pub nutriments: Option<Nutriments>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(clippy::struct_field_names)]
pub struct Nutriments {
    #[serde(rename = "energy-kcal_100g")]
    pub energy_kcal_100g: Option<f64>,
    pub carbohydrates_100g: Option<f64>,
    pub proteins_100g: Option<f64>,
    pub fat_100g: Option<f64>,
    pub fiber_100g: Option<f64>,
    pub sugars_100g: Option<f64>,
    /// Grams per 100 g.
    pub sodium_100g: Option<f64>,
}

/// Extract the found product, if the response says there is one.
#[must_use]
pub fn found_product(resp: ProductResponse) -> Option<ProductData> {
    if resp.status != 1 {
        return None;
    }
    resp.product
}

#[must_use]
pub fn product_to_source(p: ProductData, barcode: &str) -> SourceFoodRecord {
    let n = p.nutriments.unwrap_or_default();

    SourceFoodRecord {
        id: format!("off_{barcode}"),
        barcode: barcode.to_string(),
        name: p
            .product_name
            .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
        brand: p.brands,
        image_url: p.image_front_url.or(p.image_url),
        calories_per_100g: n.energy_kcal_100g.unwrap_or(0.0),
        carbs_per_100g: n.carbohydrates_100g.unwrap_or(0.0),
        protein_per_100g: n.proteins_100g.unwrap_or(0.0),
        fat_per_100g: n.fat_100g.unwrap_or(0.0),
        fiber_per_100g: n.fiber_100g,
        sugar_per_100g: n.sugars_100g,
        sodium_mg_per_100g: n.sodium_100g.map(|g| g * 1000.0),
        glycemic_index: None,
        serving_size_g: parse_serving_size(p.serving_size.as_deref()),
    }
}

/// Grams from free-text serving sizes like "100g" or "1 serving (30g)".
///
/// A number followed by a gram unit wins; otherwise the first number in the
/// text is used, and 100 g when there is none.
#[must_use]
pub fn parse_serving_size(serving: Option<&str>) -> f64 {
    let Some(s) = serving else {
        return DEFAULT_SERVING_G;
    };

    GRAMS
        .captures(s)
        .and_then(|c| c.get(1))
        .or_else(|| FIRST_NUMBER.find(s))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(DEFAULT_SERVING_G)
}
