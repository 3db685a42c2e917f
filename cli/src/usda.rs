use anyhow::{Context, Result};
use async_trait::async_trait;

use diabeat_core::models::SourceFoodRecord;
use diabeat_core::reconcile::NutritionProvider;
use diabeat_core::usda::{SearchResponse, first_food, food_to_source};

const SEARCH_URL: &str = "https://api.nal.usda.gov/fdc/v1/foods/search";

/// USDA FoodData Central, searched by GTIN/UPC among branded foods.
pub struct UsdaClient {
    client: reqwest::Client,
    api_key: String,
}

impl UsdaClient {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }

    fn query<'a>(&'a self, barcode: &'a str) -> [(&'static str, &'a str); 4] {
        [
            ("query", barcode),
            ("dataType", "Branded"),
            ("pageSize", "1"),
            ("api_key", self.api_key.as_str()),
        ]
    }
}

#[async_trait]
impl NutritionProvider for UsdaClient {
    async fn lookup_barcode(&self, barcode: &str) -> Result<Option<SourceFoodRecord>> {
        let data: SearchResponse = self
            .client
            .get(SEARCH_URL)
            .query(&self.query(barcode))
            .send()
            .await
            .context("Failed to reach USDA FoodData Central API")?
            .error_for_status()
            .context("USDA FoodData Central API returned an error")?
            .json()
            .await
            .context("Failed to parse USDA search response")?;

        Ok(first_food(data).map(|f| food_to_source(f, barcode)))
    }
}
