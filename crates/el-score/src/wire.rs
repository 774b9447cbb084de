//! JSON contracts spoken with the scoring service.

use el_core::EngineError;
use el_core::EngineResult;
use serde::Deserialize;
use serde::Serialize;

/// Request body for `POST /analyze`. Immutable once built; `url` is captured
/// at the moment the originating navigation settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    pub url: String,
    pub detailed: bool,
    #[serde(rename = "cache")]
    pub use_cache: bool,
}

impl AnalysisRequest {
    pub fn for_page(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            detailed: true,
            use_cache: true,
        }
    }

    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string(self).map_err(|error| {
            EngineError::new(
                "score.request_encode_failed",
                format!("failed to encode analysis request: {error}"),
            )
        })
    }
}

/// Scored environmental metrics, all on the service's 0-100 scales except
/// the raw physical totals.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnvironmentalScore {
    pub co2_total_kg: f64,
    pub water_usage_liters: f64,
    pub recyclability_score: f64,
    pub overall_eco_score: f64,
    pub confidence_level: f64,
}

/// Full analysis payload. The service sends additional fields
/// (`product_name`, `durability_score`, timestamps); they are ignored here
/// but preserved in the cache because the raw body is what gets stored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisResult {
    pub environmental_score: EnvironmentalScore,
    pub recommendations: Vec<String>,
}

impl AnalysisResult {
    pub fn from_json(body: &str) -> EngineResult<Self> {
        serde_json::from_str(body).map_err(|error| {
            EngineError::new(
                "score.payload_invalid",
                format!("analysis payload did not match the expected shape: {error}"),
            )
        })
    }
}

/// A parsed result paired with the exact bytes the service sent, so the
/// cache can store the body verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAnalysis {
    pub result: AnalysisResult,
    pub raw_body: String,
}

#[cfg(test)]
mod tests {
    use super::AnalysisRequest;
    use super::AnalysisResult;

    #[test]
    fn request_uses_cache_wire_name() {
        let encoded = AnalysisRequest::for_page("https://example.com/dp/B1").to_json();
        assert_eq!(
            encoded,
            Ok(
                "{\"url\":\"https://example.com/dp/B1\",\"detailed\":true,\"cache\":true}"
                    .to_owned()
            )
        );
    }

    #[test]
    fn parses_full_service_payload_with_extra_fields() {
        let body = r#"{
            "product_name": "Widget Pro",
            "environmental_score": {
                "co2_total_kg": 12.3,
                "water_usage_liters": 40.0,
                "recyclability_score": 60.0,
                "durability_score": 70.0,
                "overall_eco_score": 85.0,
                "confidence_level": 90.0
            },
            "recommendations": ["Buy refurbished"],
            "cached": false,
            "timestamp": "2026-08-06T00:00:00"
        }"#;

        let parsed = AnalysisResult::from_json(body);
        assert!(parsed.is_ok());
        let parsed = match parsed {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(parsed.environmental_score.overall_eco_score, 85.0);
        assert_eq!(parsed.environmental_score.co2_total_kg, 12.3);
        assert_eq!(parsed.recommendations, vec!["Buy refurbished".to_owned()]);
    }

    #[test]
    fn missing_score_block_is_a_payload_error() {
        let parsed = AnalysisResult::from_json("{\"recommendations\": []}");
        assert!(parsed.is_err());
        if let Err(error) = parsed {
            assert_eq!(error.code, "score.payload_invalid");
        }
    }

    #[test]
    fn non_json_body_is_a_payload_error() {
        let parsed = AnalysisResult::from_json("<html>maintenance page</html>");
        assert!(parsed.is_err());
        if let Err(error) = parsed {
            assert_eq!(error.code, "score.payload_invalid");
        }
    }
}
