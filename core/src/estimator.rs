//! Client-side blood glucose estimate from today's intake.
//!
//! This is a rough heuristic for an immediate dashboard reading, not the
//! backend's prediction model. It never fails: every missing input has a
//! fallback.

use chrono::{DateTime, Utc};

use crate::models::{DailyIntakeSnapshot, GlucosePrediction, GlucoseStatus};

/// Fasting baseline, mmol/L.
pub const BASELINE_MMOL_L: f64 = 5.6;
/// Grams of carbohydrate per 1 mmol/L rise.
pub const CARBS_PER_UNIT_G: f64 = 15.0;
pub const MIN_MMOL_L: f64 = 3.9;
pub const MAX_MMOL_L: f64 = 11.1;
/// Readings above this are classified high.
pub const HIGH_THRESHOLD_MMOL_L: f64 = 7.8;

const UNKNOWN_MEAL_DECAY: f64 = 0.8;
const AMPLE_WATER_ML: f64 = 2000.0;

#[must_use]
pub fn estimate(snapshot: &DailyIntakeSnapshot, now: DateTime<Utc>) -> GlucosePrediction {
    let carb_rise = snapshot.carbs_g / CARBS_PER_UNIT_G;
    let decay = time_decay(snapshot.last_meal_at, now);
    let water = water_factor(snapshot.water_ml.unwrap_or(AMPLE_WATER_ML));
    let exercise = exercise_reduction(snapshot.exercise_kcal.unwrap_or(0.0));

    let unclamped = BASELINE_MMOL_L + carb_rise * decay * water - exercise;
    let value = unclamped.clamp(MIN_MMOL_L, MAX_MMOL_L);

    GlucosePrediction {
        value,
        unclamped,
        status: classify(value),
    }
}

/// Multiplier on the carb rise by time since the last meal.
#[must_use]
pub fn time_decay(last_meal_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(last_meal_at) = last_meal_at else {
        return UNKNOWN_MEAL_DECAY;
    };

    // Whole minutes, so 59m59s still counts as under an hour.
    #[allow(clippy::cast_precision_loss)]
    let hours = (now - last_meal_at).num_minutes() as f64 / 60.0;

    if hours < 1.0 {
        1.0
    } else if hours < 2.0 {
        0.9
    } else if hours < 3.0 {
        0.8
    } else if hours < 4.0 {
        0.6
    } else {
        0.5
    }
}

#[must_use]
pub fn water_factor(water_ml: f64) -> f64 {
    if water_ml >= 2000.0 {
        1.0
    } else if water_ml >= 1000.0 {
        0.95
    } else {
        0.9
    }
}

/// mmol/L subtracted for exercise, capped at 2.0.
#[must_use]
pub fn exercise_reduction(kcal: f64) -> f64 {
    if kcal < 150.0 {
        kcal / 300.0
    } else if kcal < 300.0 {
        0.5 + (kcal - 150.0) / 300.0
    } else {
        1.0 + (kcal - 300.0).min(200.0) / 200.0
    }
}

#[must_use]
pub fn classify(mmol_l: f64) -> GlucoseStatus {
    if mmol_l < MIN_MMOL_L {
        GlucoseStatus::Low
    } else if mmol_l > HIGH_THRESHOLD_MMOL_L {
        GlucoseStatus::High
    } else {
        GlucoseStatus::Normal
    }
}

/// Parse a logged meal time. Anything unparseable is treated as unknown.
#[must_use]
pub fn parse_meal_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
