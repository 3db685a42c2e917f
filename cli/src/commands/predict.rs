use anyhow::{Result, bail};
use chrono::Utc;

use diabeat_core::estimator::{estimate, parse_meal_time};
use diabeat_core::models::{DailyIntakeSnapshot, GlucoseUnit};

pub(crate) struct PredictArgs {
    pub carbs: f64,
    pub exercise: Option<f64>,
    pub water: Option<f64>,
    pub last_meal: Option<String>,
    pub unit: GlucoseUnit,
    pub json: bool,
}

pub(crate) fn build_snapshot(args: &PredictArgs) -> Result<DailyIntakeSnapshot> {
    for (name, value) in [
        ("carbs", Some(args.carbs)),
        ("exercise", args.exercise),
        ("water", args.water),
    ] {
        if value.is_some_and(|v| v < 0.0 || !v.is_finite()) {
            bail!("--{name} must be a non-negative number");
        }
    }

    let last_meal_at = args.last_meal.as_deref().and_then(|s| {
        let parsed = parse_meal_time(s);
        if parsed.is_none() {
            eprintln!("Note: could not parse last meal time '{s}'; treating it as unknown");
        }
        parsed
    });

    Ok(DailyIntakeSnapshot {
        carbs_g: args.carbs,
        exercise_kcal: args.exercise,
        water_ml: args.water,
        last_meal_at,
    })
}

pub(crate) fn cmd_predict(args: &PredictArgs) -> Result<()> {
    let snapshot = build_snapshot(args)?;
    let prediction = estimate(&snapshot, Utc::now());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
        return Ok(());
    }

    let reading = prediction.format(args.unit);
    let status = prediction.status.label().to_uppercase();
    println!("Predicted glucose: {reading} ({status})");
    println!("Estimate from today's intake only. Confirm with a meter reading.");

    Ok(())
}
