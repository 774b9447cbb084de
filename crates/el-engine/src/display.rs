//! Presentation projection of an analysis result.

use el_score::AnalysisResult;

/// Driving-distance equivalence used for the CO₂ headline figure.
const CO2_KG_PER_KM_DRIVEN: f64 = 0.12;

/// Color band for an overall eco score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    Good,
    Moderate,
    Poor,
}

impl ScoreTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            Self::Good
        } else if score >= 40.0 {
            Self::Moderate
        } else {
            Self::Poor
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Good => "#4caf50",
            Self::Moderate => "#ff9800",
            Self::Poor => "#f44336",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Poor => "poor",
        }
    }
}

/// What the widget presenter paints. Derived on demand from an
/// `AnalysisResult`, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayModel {
    pub overall_eco_score: u8,
    pub confidence_level: u8,
    pub recyclability_score: u8,
    /// Kilograms, rounded to one decimal.
    pub co2_total_kg: f64,
    /// Litres, rounded to a whole number.
    pub water_usage_liters: f64,
    pub co2_equivalent: String,
    pub tier: ScoreTier,
    pub recommendations: Vec<String>,
}

impl DisplayModel {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let score = &result.environmental_score;
        Self {
            overall_eco_score: round_score(score.overall_eco_score),
            confidence_level: round_score(score.confidence_level),
            recyclability_score: round_score(score.recyclability_score),
            co2_total_kg: (score.co2_total_kg * 10.0).round() / 10.0,
            water_usage_liters: score.water_usage_liters.round(),
            co2_equivalent: co2_equivalent(score.co2_total_kg),
            tier: ScoreTier::from_score(score.overall_eco_score),
            recommendations: result.recommendations.clone(),
        }
    }
}

/// Rounds a 0-100 service score to an integer, clamping anything the service
/// sends out of range.
pub(crate) fn round_score(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}

fn co2_equivalent(co2_total_kg: f64) -> String {
    let km = (co2_total_kg / CO2_KG_PER_KM_DRIVEN).round() as i64;
    format!("about {km} km of driving")
}
