use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which nutrition database(s) a [`FoodRecord`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Usda,
    OpenFoodFacts,
    /// Both providers answered for the barcode. Their values may still have
    /// disagreed, in which case the USDA values were kept.
    DualVerified,
}

impl DataSource {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Usda => "USDA",
            Self::OpenFoodFacts => "OpenFoodFacts",
            Self::DualVerified => "dual-verified",
        }
    }
}

/// Nutrition for one product as reported by a single provider, normalised to
/// kcal and milligrams of sodium. All amounts are per 100 g.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFoodRecord {
    pub id: String,
    pub barcode: String,
    pub name: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub calories_per_100g: f64,
    pub carbs_per_100g: f64,
    pub protein_per_100g: f64,
    pub fat_per_100g: f64,
    pub fiber_per_100g: Option<f64>,
    pub sugar_per_100g: Option<f64>,
    pub sodium_mg_per_100g: Option<f64>,
    pub glycemic_index: Option<u32>,
    pub serving_size_g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub id: String,
    pub barcode: String,
    pub name: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub calories_per_100g: f64,
    pub carbs_per_100g: f64,
    pub protein_per_100g: f64,
    pub fat_per_100g: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber_per_100g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugar_per_100g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sodium_mg_per_100g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glycemic_index: Option<u32>,
    pub serving_size_g: f64,
    pub source: DataSource,
}

impl FoodRecord {
    /// Pass a single provider's record through unchanged, tagged with where it came from.
    #[must_use]
    pub fn from_source(record: SourceFoodRecord, source: DataSource) -> Self {
        Self {
            id: record.id,
            barcode: record.barcode,
            name: record.name,
            brand: record.brand,
            image_url: record.image_url,
            calories_per_100g: record.calories_per_100g,
            carbs_per_100g: record.carbs_per_100g,
            protein_per_100g: record.protein_per_100g,
            fat_per_100g: record.fat_per_100g,
            fiber_per_100g: record.fiber_per_100g,
            sugar_per_100g: record.sugar_per_100g,
            sodium_mg_per_100g: record.sodium_mg_per_100g,
            glycemic_index: record.glycemic_index,
            serving_size_g: record.serving_size_g,
            source,
        }
    }

    /// Macros for `serving_g` grams of this food.
    #[must_use]
    pub fn portion(&self, serving_g: f64) -> Portion {
        let factor = serving_g / 100.0;
        Portion {
            serving_g,
            calories: self.calories_per_100g * factor,
            carbs: self.carbs_per_100g * factor,
            protein: self.protein_per_100g * factor,
            fat: self.fat_per_100g * factor,
        }
    }

    /// How suitable this food is for someone managing blood glucose, from its
    /// per-100g carbs, sugar, fiber and glycemic index.
    ///
    /// Starts at 100; unknown sugar, fiber or GI leave the score unchanged.
    #[must_use]
    pub fn diabetes_score(&self) -> DiabetesScore {
        let mut score: i32 = 100;

        let carbs = self.carbs_per_100g;
        if carbs > 50.0 {
            score -= 30;
        } else if carbs > 30.0 {
            score -= 20;
        } else if carbs > 15.0 {
            score -= 10;
        }

        if let Some(sugar) = self.sugar_per_100g {
            if sugar > 15.0 {
                score -= 25;
            } else if sugar > 10.0 {
                score -= 15;
            } else if sugar > 5.0 {
                score -= 5;
            }
        }

        if let Some(fiber) = self.fiber_per_100g {
            if fiber > 5.0 {
                score += 10;
            } else if fiber > 3.0 {
                score += 5;
            }
        }

        if let Some(gi) = self.glycemic_index {
            score += match gi {
                71.. => -20,
                56..=70 => -10,
                _ => 10,
            };
        }

        let score = u8::try_from(score.clamp(0, 100)).unwrap_or_default();

        let mut warnings = Vec::new();
        if carbs > HIGH_CARB_G {
            warnings.push(DietWarning::HighCarb);
        }
        if self.sugar_per_100g.is_some_and(|s| s > HIGH_SUGAR_G) {
            warnings.push(DietWarning::HighSugar);
        }

        DiabetesScore {
            score,
            rating: DiabetesRating::from_score(score),
            warnings,
        }
    }
}

const HIGH_CARB_G: f64 = 30.0;
const HIGH_SUGAR_G: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiabetesRating {
    Excellent,
    Good,
    Moderate,
    Caution,
}

impl DiabetesRating {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            75.. => Self::Excellent,
            50..=74 => Self::Good,
            25..=49 => Self::Moderate,
            _ => Self::Caution,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::Caution => "Caution",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietWarning {
    HighCarb,
    HighSugar,
}

impl DietWarning {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::HighCarb => "High carb food - monitor glucose closely",
            Self::HighSugar => "High sugar content - limit serving size",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiabetesScore {
    /// 0 to 100, higher is friendlier.
    pub score: u8,
    pub rating: DiabetesRating,
    pub warnings: Vec<DietWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Portion {
    pub serving_g: f64,
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
}

/// Today's aggregated intake, as handed to the estimator.
///
/// `None` means the day's summary was unavailable, which is not the same as
/// zero: missing water is treated as well hydrated, and a missing meal time
/// gets its own decay factor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyIntakeSnapshot {
    pub carbs_g: f64,
    #[serde(default)]
    pub exercise_kcal: Option<f64>,
    #[serde(default)]
    pub water_ml: Option<f64>,
    #[serde(default)]
    pub last_meal_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlucoseStatus {
    Low,
    Normal,
    High,
}

impl GlucoseStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlucosePrediction {
    /// Predicted value in mmol/L, always within the physiological band.
    pub value: f64,
    /// The value before clamping.
    #[serde(skip)]
    pub unclamped: f64,
    pub status: GlucoseStatus,
}

impl GlucosePrediction {
    #[must_use]
    pub fn format(&self, unit: GlucoseUnit) -> String {
        unit.format(self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlucoseUnit {
    #[default]
    MmolL,
    MgDl,
}

const MGDL_PER_MMOLL: f64 = 18.0;

impl GlucoseUnit {
    /// Convert a mmol/L value into this unit.
    #[must_use]
    pub fn convert(self, mmol_l: f64) -> f64 {
        match self {
            Self::MmolL => mmol_l,
            Self::MgDl => mmol_l * MGDL_PER_MMOLL,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::MmolL => "mmol/L",
            Self::MgDl => "mg/dL",
        }
    }

    #[must_use]
    pub fn format(self, mmol_l: f64) -> String {
        let value = self.convert(mmol_l);
        let label = self.label();
        match self {
            Self::MmolL => format!("{value:.1} {label}"),
            Self::MgDl => format!("{value:.0} {label}"),
        }
    }
}

impl std::str::FromStr for GlucoseUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().replace(['/', ' '], "").as_str() {
            "mmol" | "mmoll" => Ok(Self::MmolL),
            "mgdl" | "mg" => Ok(Self::MgDl),
            other => anyhow::bail!("Unknown glucose unit '{other}'. Use 'mmol' or 'mgdl'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oats() -> FoodRecord {
        FoodRecord {
            id: "off_123".to_string(),
            barcode: "123".to_string(),
            name: "Rolled Oats".to_string(),
            brand: None,
            image_url: None,
            calories_per_100g: 380.0,
            carbs_per_100g: 60.0,
            protein_per_100g: 13.0,
            fat_per_100g: 7.0,
            fiber_per_100g: Some(10.0),
            sugar_per_100g: None,
            sodium_mg_per_100g: None,
            glycemic_index: None,
            serving_size_g: 40.0,
            source: DataSource::OpenFoodFacts,
        }
    }

    #[test]
    fn portion_scales_per_100g_values() {
        let p = oats().portion(40.0);
        assert!((p.calories - 152.0).abs() < 1e-9);
        assert!((p.carbs - 24.0).abs() < 1e-9);
        assert!((p.protein - 5.2).abs() < 1e-9);
        assert!((p.fat - 2.8).abs() < 1e-9);
    }

    #[test]
    fn food_record_json_uses_snake_case_source() {
        let json = serde_json::to_value(oats()).unwrap();
        assert_eq!(json["source"], "open_food_facts");
        assert_eq!(json["fiber_per_100g"], 10.0);
        // Absent optionals are omitted rather than null
        assert!(json.get("sugar_per_100g").is_none());
    }

    fn scored(carbs: f64, sugar: Option<f64>, fiber: Option<f64>, gi: Option<u32>) -> DiabetesScore {
        FoodRecord {
            carbs_per_100g: carbs,
            sugar_per_100g: sugar,
            fiber_per_100g: fiber,
            glycemic_index: gi,
            ..oats()
        }
        .diabetes_score()
    }

    #[test]
    fn diabetes_score_carb_thresholds() {
        assert_eq!(scored(15.0, None, None, None).score, 100);
        assert_eq!(scored(15.1, None, None, None).score, 90);
        assert_eq!(scored(30.0, None, None, None).score, 90);
        assert_eq!(scored(30.1, None, None, None).score, 80);
        assert_eq!(scored(50.0, None, None, None).score, 80);
        assert_eq!(scored(50.1, None, None, None).score, 70);
    }

    #[test]
    fn diabetes_score_sugar_thresholds() {
        assert_eq!(scored(0.0, Some(5.0), None, None).score, 100);
        assert_eq!(scored(0.0, Some(5.1), None, None).score, 95);
        assert_eq!(scored(0.0, Some(10.0), None, None).score, 95);
        assert_eq!(scored(0.0, Some(10.1), None, None).score, 85);
        assert_eq!(scored(0.0, Some(15.0), None, None).score, 85);
        assert_eq!(scored(0.0, Some(15.1), None, None).score, 75);
    }

    #[test]
    fn diabetes_score_fiber_and_gi_thresholds() {
        // Start from 70 so bonuses are visible below the clamp
        assert_eq!(scored(60.0, None, Some(3.0), None).score, 70);
        assert_eq!(scored(60.0, None, Some(3.1), None).score, 75);
        assert_eq!(scored(60.0, None, Some(5.0), None).score, 75);
        assert_eq!(scored(60.0, None, Some(5.1), None).score, 80);

        assert_eq!(scored(60.0, None, None, Some(55)).score, 80);
        assert_eq!(scored(60.0, None, None, Some(56)).score, 60);
        assert_eq!(scored(60.0, None, None, Some(70)).score, 60);
        assert_eq!(scored(60.0, None, None, Some(71)).score, 50);
    }

    #[test]
    fn diabetes_score_is_clamped() {
        let best = scored(0.0, Some(0.0), Some(20.0), Some(30));
        assert_eq!(best.score, 100);
        assert_eq!(best.rating, DiabetesRating::Excellent);

        // 100 - 30 - 25 - 20 = 25, the lowest reachable value
        let worst = scored(80.0, Some(40.0), Some(0.0), Some(90));
        assert_eq!(worst.score, 25);
        assert_eq!(worst.rating, DiabetesRating::Moderate);
    }

    #[test]
    fn diabetes_score_missing_values_contribute_nothing() {
        let s = scored(20.0, None, None, None);
        assert_eq!(s.score, 90);
        assert!(!s.warnings.contains(&DietWarning::HighSugar));
    }

    #[test]
    fn diabetes_rating_bands() {
        assert_eq!(DiabetesRating::from_score(100), DiabetesRating::Excellent);
        assert_eq!(DiabetesRating::from_score(75), DiabetesRating::Excellent);
        assert_eq!(DiabetesRating::from_score(74), DiabetesRating::Good);
        assert_eq!(DiabetesRating::from_score(50), DiabetesRating::Good);
        assert_eq!(DiabetesRating::from_score(49), DiabetesRating::Moderate);
        assert_eq!(DiabetesRating::from_score(25), DiabetesRating::Moderate);
        assert_eq!(DiabetesRating::from_score(24), DiabetesRating::Caution);
        assert_eq!(DiabetesRating::from_score(0), DiabetesRating::Caution);
    }

    #[test]
    fn diabetes_warnings() {
        assert!(scored(30.0, Some(10.0), None, None).warnings.is_empty());
        assert_eq!(
            scored(30.1, Some(10.1), None, None).warnings,
            vec![DietWarning::HighCarb, DietWarning::HighSugar]
        );

        let json = serde_json::to_value(oats().diabetes_score()).unwrap();
        // oats: 60g carbs -30, fiber 10g +10
        assert_eq!(json["score"], 80);
        assert_eq!(json["rating"], "excellent");
        assert_eq!(json["warnings"][0], "high_carb");
    }

    #[test]
    fn glucose_unit_conversion_and_format() {
        assert_eq!(GlucoseUnit::MmolL.format(6.14), "6.1 mmol/L");
        assert_eq!(GlucoseUnit::MgDl.format(6.1), "110 mg/dL");
        assert!((GlucoseUnit::MgDl.convert(5.6) - 100.8).abs() < 1e-9);
    }

    #[test]
    fn glucose_unit_parsing() {
        assert_eq!("mmol".parse::<GlucoseUnit>().unwrap(), GlucoseUnit::MmolL);
        assert_eq!("mmol/L".parse::<GlucoseUnit>().unwrap(), GlucoseUnit::MmolL);
        assert_eq!("mg/dL".parse::<GlucoseUnit>().unwrap(), GlucoseUnit::MgDl);
        assert!("furlongs".parse::<GlucoseUnit>().is_err());
    }

    #[test]
    fn status_serialises_lowercase() {
        assert_eq!(serde_json::to_value(GlucoseStatus::High).unwrap(), "high");
        assert_eq!(GlucoseStatus::Normal.label(), "normal");
    }
}
