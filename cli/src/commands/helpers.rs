use anyhow::{Context, Result, bail};
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use diabeat_core::models::{DiabetesScore, FoodRecord, Portion};

pub(crate) fn parse_serving(s: &str) -> Result<f64> {
    let trimmed = s.trim().trim_end_matches('g').trim();
    let value: f64 = trimmed.parse().with_context(|| {
        format!("Invalid serving size: '{s}'. Use a number like '30' or '30g'")
    })?;
    if value <= 0.0 {
        bail!("Serving size must be greater than 0");
    }
    Ok(value)
}

pub(crate) fn print_food_record(food: &FoodRecord, portion: &Portion, score: &DiabetesScore) {
    #[derive(Tabled)]
    struct NutrientRow {
        #[tabled(rename = "Nutrient")]
        name: &'static str,
        #[tabled(rename = "Per 100g")]
        per_100g: String,
        #[tabled(rename = "Per serving")]
        per_serving: String,
    }

    let brand = food
        .brand
        .as_ref()
        .map(|b| format!(" ({})", truncate(b, 30)))
        .unwrap_or_default();
    println!("{}{brand}", truncate(&food.name, 50));
    println!("Barcode: {}  ·  Source: {}", food.barcode, food.source.label());
    if let Some(url) = &food.image_url {
        println!("Image: {url}");
    }
    println!();

    let scale = |v: f64| v * portion.serving_g / 100.0;
    let optional = |v: Option<f64>, unit: &str| {
        v.map_or(("-".to_string(), "-".to_string()), |v| {
            (format!("{v:.1}{unit}"), format!("{:.1}{unit}", scale(v)))
        })
    };

    let mut rows = vec![
        NutrientRow {
            name: "Calories",
            per_100g: format!("{:.0} kcal", food.calories_per_100g),
            per_serving: format!("{:.0} kcal", no_neg_zero(portion.calories)),
        },
        NutrientRow {
            name: "Carbs",
            per_100g: format!("{:.1}g", food.carbs_per_100g),
            per_serving: format!("{:.1}g", portion.carbs),
        },
        NutrientRow {
            name: "Protein",
            per_100g: format!("{:.1}g", food.protein_per_100g),
            per_serving: format!("{:.1}g", portion.protein),
        },
        NutrientRow {
            name: "Fat",
            per_100g: format!("{:.1}g", food.fat_per_100g),
            per_serving: format!("{:.1}g", portion.fat),
        },
    ];
    for (name, value, unit) in [
        ("Fiber", food.fiber_per_100g, "g"),
        ("Sugar", food.sugar_per_100g, "g"),
        ("Sodium", food.sodium_mg_per_100g, "mg"),
    ] {
        let (per_100g, per_serving) = optional(value, unit);
        rows.push(NutrientRow {
            name,
            per_100g,
            per_serving,
        });
    }

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let serving = portion.serving_g;
    println!("Serving: {serving:.0}g");
    if let Some(gi) = food.glycemic_index {
        println!("Glycemic index: {gi}");
    }
    println!(
        "Diabetes friendly score: {}/100 ({})",
        score.score,
        score.rating.label()
    );
    for warning in &score.warnings {
        println!("  ! {}", warning.message());
    }
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serving() {
        assert!((parse_serving("30").unwrap() - 30.0).abs() < f64::EPSILON);
        assert!((parse_serving("30g").unwrap() - 30.0).abs() < f64::EPSILON);
        assert!((parse_serving(" 12.5 g ").unwrap() - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_serving_invalid() {
        assert!(parse_serving("abc").is_err());
        assert!(parse_serving("0").is_err());
        assert!(parse_serving("-5g").is_err());
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("nope"), r#"{"error":"nope"}"#);
        assert_eq!(json_error("say \"hi\""), r#"{"error":"say \"hi\""}"#);
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("日清カップヌードル", 8), "日清カップ...");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(5.0), 5.0);
    }
}
