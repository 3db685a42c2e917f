use std::collections::HashMap;

use serde::Deserialize;

use crate::models::SourceFoodRecord;

pub const KJ_PER_KCAL: f64 = 4.184;

pub const ENERGY: &str = "Energy";
pub const PROTEIN: &str = "Protein";
pub const FAT: &str = "Total lipid (fat)";
pub const CARBS: &str = "Carbohydrate, by difference";
pub const FIBER: &str = "Fiber, total dietary";
pub const SUGARS: &str = "Sugars, total including NLEA";
pub const SODIUM: &str = "Sodium, Na";

/// Branded items are reported per 100 g in the search endpoint.
const SERVING_SIZE_G: f64 = 100.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub foods: Vec<SearchFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFood {
    pub fdc_id: i64,
    pub description: String,
    pub brand_owner: Option<String>,
    pub gtin_upc: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<FoodNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodNutrient {
    pub nutrient_name: String,
    #[serde(default)]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

/// The first search candidate, if any.
#[must_use]
pub fn first_food(resp: SearchResponse) -> Option<SearchFood> {
    resp.foods.into_iter().next()
}

#[must_use]
pub fn food_to_source(food: SearchFood, barcode: &str) -> SourceFoodRecord {
    let nutrients: HashMap<&str, f64> = food
        .food_nutrients
        .iter()
        .filter_map(|n| n.value.map(|v| (n.nutrient_name.as_str(), v)))
        .collect();
    let get = |name: &str| nutrients.get(name).copied();

    SourceFoodRecord {
        id: format!("usda_{}", food.fdc_id),
        barcode: barcode.to_string(),
        name: food.description.clone(),
        brand: food.brand_owner.clone(),
        image_url: None,
        calories_per_100g: get(ENERGY).map_or(0.0, |kj| kj / KJ_PER_KCAL),
        carbs_per_100g: get(CARBS).unwrap_or(0.0),
        protein_per_100g: get(PROTEIN).unwrap_or(0.0),
        fat_per_100g: get(FAT).unwrap_or(0.0),
        fiber_per_100g: get(FIBER),
        sugar_per_100g: get(SUGARS),
        sodium_mg_per_100g: get(SODIUM),
        glycemic_index: None,
        serving_size_g: SERVING_SIZE_G,
    }
}
