use anyhow::{Result, bail};
use serde::Serialize;
use std::process;

use diabeat_core::models::{DiabetesScore, FoodRecord, Portion};
use diabeat_core::reconcile::{NutritionProvider, scan_barcode, valid_barcode};

use super::helpers::{json_error, parse_serving, print_food_record};

#[derive(Serialize)]
struct ScanOutput<'a> {
    food: &'a FoodRecord,
    portion: Portion,
    diabetes_score: DiabetesScore,
}

pub(crate) async fn cmd_scan(
    usda: &dyn NutritionProvider,
    off: &dyn NutritionProvider,
    barcode: &str,
    serving: Option<&str>,
    json: bool,
) -> Result<()> {
    let Some(barcode) = valid_barcode(barcode) else {
        bail!(
            "Invalid barcode '{}': expected digits only",
            barcode.trim()
        );
    };
    let serving_g = serving.map(parse_serving).transpose()?;

    let food = match scan_barcode(usda, off, barcode).await {
        Ok(food) => food,
        Err(e) => {
            if json {
                println!("{}", json_error(&e.to_string()));
            } else {
                eprintln!("{e}");
            }
            process::exit(2);
        }
    };

    let portion = food.portion(serving_g.unwrap_or(food.serving_size_g));
    let diabetes_score = food.diabetes_score();

    if json {
        let out = ScanOutput {
            food: &food,
            portion,
            diabetes_score,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_food_record(&food, &portion, &diabetes_score);
    }

    Ok(())
}
