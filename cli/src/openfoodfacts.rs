use anyhow::{Context, Result};
use async_trait::async_trait;

use diabeat_core::models::SourceFoodRecord;
use diabeat_core::openfoodfacts::{ProductResponse, found_product, product_to_source};
use diabeat_core::reconcile::NutritionProvider;

const PRODUCT_URL: &str = "https://world.openfoodfacts.org/api/v2/product";

pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: PRODUCT_URL.to_string(),
        }
    }

    fn product_url(&self, barcode: &str) -> String {
        format!("{}/{barcode}", self.base_url)
    }
}

#[async_trait]
impl NutritionProvider for OpenFoodFactsClient {
    async fn lookup_barcode(&self, barcode: &str) -> Result<Option<SourceFoodRecord>> {
        let resp = self
            .client
            .get(self.product_url(barcode))
            .send()
            .await
            .context("Failed to reach OpenFoodFacts API")?;

        // OpenFoodFacts answers unknown barcodes with a 404 and a status-0 body.
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let data: ProductResponse = resp
            .error_for_status()
            .context("OpenFoodFacts API returned an error")?
            .json()
            .await
            .context("Failed to parse OpenFoodFacts product response")?;

        Ok(found_product(data).map(|p| product_to_source(p, barcode)))
    }
}
