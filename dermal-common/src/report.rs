//! Dermal analysis report schema
//!
//! A `DermalReport` is the terminal artifact of one analysis session. It is
//! only trusted after [`DermalReport::validate`] succeeds; candidate reports
//! from the model are decoded with [`DermalReport::from_json_value`], which
//! deserializes and validates in one step.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Number of findings every report carries
pub const FINDING_COUNT: usize = 2;

/// Name under which the report schema is offered to the model
pub const REPORT_SCHEMA_NAME: &str = "DermalReport";

/// Description attached to the report schema
pub const REPORT_SCHEMA_DESCRIPTION: &str = "Structured dermal analysis report";

static PROFILE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^SK-[0-9]{5}$").expect("profile id pattern is valid"));

static SIGNED_YEARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+(\.[0-9]+)?y$").expect("signed years pattern is valid"));

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+([_-][a-z0-9]+)*$").expect("slug pattern is valid"));

/// Report validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ReportError {
    #[error("Malformed report: {0}")]
    Malformed(String),

    #[error("Invalid profile id {0:?} (expected SK- followed by 5 digits)")]
    InvalidProfileId(String),

    #[error("Invalid {field} {value:?} (expected signed years such as +4.2y)")]
    InvalidYears { field: &'static str, value: String },

    #[error("{field} value {value} out of range 0-100")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("Expected 2 findings, got {0}")]
    FindingCount(usize),

    #[error("Invalid finding id {0:?}")]
    InvalidFindingId(String),

    #[error("Empty field: {0}")]
    EmptyField(&'static str),
}

/// Report headline verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Headline {
    #[serde(rename = "Bio-Age Accelerated")]
    Accelerated,
    #[serde(rename = "Bio-Age Aligned")]
    Aligned,
    #[serde(rename = "Bio-Age Optimized")]
    Optimized,
}

impl Headline {
    pub const ALL: [Headline; 3] = [Headline::Accelerated, Headline::Aligned, Headline::Optimized];

    pub fn as_str(&self) -> &'static str {
        match self {
            Headline::Accelerated => "Bio-Age Accelerated",
            Headline::Aligned => "Bio-Age Aligned",
            Headline::Optimized => "Bio-Age Optimized",
        }
    }
}

impl fmt::Display for Headline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a percentage metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// Inflammation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Inflammation {
    High,
    Moderate,
    Low,
}

impl fmt::Display for Inflammation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Inflammation::High => "High",
            Inflammation::Moderate => "Moderate",
            Inflammation::Low => "Low",
        };
        f.write_str(s)
    }
}

/// Finding icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingIcon {
    Warning,
    Alert,
}

/// Percentage metric (0-100) with trend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendMetric {
    pub value: f64,
    pub trend: Trend,
}

impl TrendMetric {
    pub fn new(value: f64, trend: Trend) -> Self {
        Self { value, trend }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub uv_damage: TrendMetric,
    pub hydration: TrendMetric,
    pub inflammation: Inflammation,
    /// Mirrors `DermalReport::bio_age_variance`
    pub dermal_bio_age: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Short slug, e.g. "dermal-thinning"
    pub id: String,
    pub title: String,
    pub icon: FindingIcon,
    pub description: String,
}

/// Finished skin analysis report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DermalReport {
    pub profile_id: String,
    pub headline: Headline,
    pub description: String,
    /// Signed years, e.g. "+4.2y", "0y", "-1.2y"
    pub bio_age_variance: String,
    pub metrics: Metrics,
    pub findings: Vec<Finding>,
}

impl DermalReport {
    /// Deserialize and validate a candidate report
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, ReportError> {
        let report: DermalReport =
            serde_json::from_value(value).map_err(|e| ReportError::Malformed(e.to_string()))?;
        report.validate()?;
        Ok(report)
    }

    /// Deserialize and validate a candidate report from JSON text
    pub fn from_json_str(raw: &str) -> Result<Self, ReportError> {
        let report: DermalReport =
            serde_json::from_str(raw.trim()).map_err(|e| ReportError::Malformed(e.to_string()))?;
        report.validate()?;
        Ok(report)
    }

    /// Check structural constraints that serde cannot express
    ///
    /// Enumerated fields are already enforced by deserialization.
    pub fn validate(&self) -> Result<(), ReportError> {
        if !PROFILE_ID_RE.is_match(&self.profile_id) {
            return Err(ReportError::InvalidProfileId(self.profile_id.clone()));
        }
        if self.description.trim().is_empty() {
            return Err(ReportError::EmptyField("description"));
        }
        check_years("bioAgeVariance", &self.bio_age_variance)?;
        check_years("dermalBioAge", &self.metrics.dermal_bio_age)?;
        check_percentage("uvDamage", self.metrics.uv_damage.value)?;
        check_percentage("hydration", self.metrics.hydration.value)?;

        if self.findings.len() != FINDING_COUNT {
            return Err(ReportError::FindingCount(self.findings.len()));
        }
        for finding in &self.findings {
            if !SLUG_RE.is_match(&finding.id) {
                return Err(ReportError::InvalidFindingId(finding.id.clone()));
            }
            if finding.title.trim().is_empty() {
                return Err(ReportError::EmptyField("findings.title"));
            }
            if finding.description.trim().is_empty() {
                return Err(ReportError::EmptyField("findings.description"));
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Copy of this report with a different profile id
    pub fn with_profile_id(&self, profile_id: impl Into<String>) -> Self {
        Self {
            profile_id: profile_id.into(),
            ..self.clone()
        }
    }
}

fn check_years(field: &'static str, value: &str) -> Result<(), ReportError> {
    if SIGNED_YEARS_RE.is_match(value) {
        Ok(())
    } else {
        Err(ReportError::InvalidYears {
            field,
            value: value.to_string(),
        })
    }
}

fn check_percentage(field: &'static str, value: f64) -> Result<(), ReportError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ReportError::OutOfRange { field, value })
    }
}

/// Generate a random profile id ("SK-" followed by 5 digits)
pub fn generate_profile_id() -> String {
    let n: u32 = rand::thread_rng().gen_range(10_000..100_000);
    format!("SK-{}", n)
}

/// JSON schema describing `DermalReport`, offered to the model for structured output
pub fn report_json_schema() -> serde_json::Value {
    let trend_metric = json!({
        "type": "object",
        "properties": {
            "value": { "type": "number", "minimum": 0, "maximum": 100 },
            "trend": { "type": "string", "enum": ["up", "down", "neutral"] }
        },
        "required": ["value", "trend"]
    });

    json!({
        "type": "object",
        "properties": {
            "profileId": { "type": "string", "pattern": "^SK-[0-9]{5}$" },
            "headline": {
                "type": "string",
                "enum": Headline::ALL.iter().map(|h| h.as_str()).collect::<Vec<_>>()
            },
            "description": { "type": "string" },
            "bioAgeVariance": { "type": "string" },
            "metrics": {
                "type": "object",
                "properties": {
                    "uvDamage": trend_metric.clone(),
                    "hydration": trend_metric,
                    "inflammation": { "type": "string", "enum": ["High", "Moderate", "Low"] },
                    "dermalBioAge": { "type": "string" }
                },
                "required": ["uvDamage", "hydration", "inflammation", "dermalBioAge"]
            },
            "findings": {
                "type": "array",
                "minItems": FINDING_COUNT,
                "maxItems": FINDING_COUNT,
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "title": { "type": "string" },
                        "icon": { "type": "string", "enum": ["warning", "alert"] },
                        "description": { "type": "string" }
                    },
                    "required": ["id", "title", "icon", "description"]
                }
            }
        },
        "required": ["profileId", "headline", "description", "bioAgeVariance", "metrics", "findings"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_value() -> serde_json::Value {
        json!({
            "profileId": "SK-12345",
            "headline": "Bio-Age Aligned",
            "description": "Dermal structure is consistent with chronological age.",
            "bioAgeVariance": "0y",
            "metrics": {
                "uvDamage": { "value": 21, "trend": "neutral" },
                "hydration": { "value": 64.5, "trend": "up" },
                "inflammation": "Low",
                "dermalBioAge": "0y"
            },
            "findings": [
                { "id": "uv-damage", "title": "UV Damage", "icon": "warning", "description": "Mild photo-ageing on the left cheek." },
                { "id": "lipid_loss", "title": "Lipid Loss", "icon": "alert", "description": "Barrier lipids slightly depleted." }
            ]
        })
    }

    #[test]
    fn test_valid_report_decodes() {
        let report = DermalReport::from_json_value(sample_value()).unwrap();
        assert_eq!(report.headline, Headline::Aligned);
        assert_eq!(report.metrics.hydration.trend, Trend::Up);
        assert_eq!(report.metrics.inflammation, Inflammation::Low);
        assert_eq!(report.findings[1].icon, FindingIcon::Alert);
    }

    #[test]
    fn test_serializes_with_camel_case_fields() {
        let report = DermalReport::from_json_value(sample_value()).unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["profileId"], "SK-12345");
        assert_eq!(value["headline"], "Bio-Age Aligned");
        assert_eq!(value["metrics"]["uvDamage"]["trend"], "neutral");
        assert_eq!(value["metrics"]["dermalBioAge"], "0y");
    }

    #[test]
    fn test_unknown_headline_is_malformed() {
        let mut value = sample_value();
        value["headline"] = json!("Bio-Age Unknown");
        assert!(matches!(
            DermalReport::from_json_value(value),
            Err(ReportError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_metrics_is_malformed() {
        let mut value = sample_value();
        value.as_object_mut().unwrap().remove("metrics");
        assert!(matches!(
            DermalReport::from_json_value(value),
            Err(ReportError::Malformed(_))
        ));
    }

    #[test]
    fn test_profile_id_pattern_enforced() {
        for bad in [
            "SK-1234",
            "SK-123456",
            "sk-12345",
            "XX-12345",
            "SK-12a45",
            "SK-١٢٣٤٥",
            "SK-１２３４５",
        ] {
            let mut value = sample_value();
            value["profileId"] = json!(bad);
            assert_eq!(
                DermalReport::from_json_value(value),
                Err(ReportError::InvalidProfileId(bad.to_string())),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_percentage_range_enforced() {
        let mut value = sample_value();
        value["metrics"]["uvDamage"]["value"] = json!(101);
        assert!(matches!(
            DermalReport::from_json_value(value),
            Err(ReportError::OutOfRange { field: "uvDamage", .. })
        ));

        let mut value = sample_value();
        value["metrics"]["hydration"]["value"] = json!(-1);
        assert!(matches!(
            DermalReport::from_json_value(value),
            Err(ReportError::OutOfRange { field: "hydration", .. })
        ));
    }

    #[test]
    fn test_years_format_enforced() {
        for good in ["+4.2y", "0y", "-1.2y", "3y"] {
            assert!(check_years("bioAgeVariance", good).is_ok(), "{}", good);
        }
        for bad in ["4.2", "+4.2 years", "y", "+.5y", "", "+٤.٢y", "３y"] {
            assert!(check_years("bioAgeVariance", bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_exactly_two_findings_required() {
        let mut value = sample_value();
        value["findings"].as_array_mut().unwrap().pop();
        assert_eq!(
            DermalReport::from_json_value(value),
            Err(ReportError::FindingCount(1))
        );
    }

    #[test]
    fn test_finding_slug_enforced() {
        let mut value = sample_value();
        value["findings"][0]["id"] = json!("Dermal Thinning");
        assert!(matches!(
            DermalReport::from_json_value(value),
            Err(ReportError::InvalidFindingId(_))
        ));
    }

    #[test]
    fn test_generate_profile_id_matches_pattern() {
        for _ in 0..50 {
            let id = generate_profile_id();
            assert!(PROFILE_ID_RE.is_match(&id), "{}", id);
        }
    }

    #[test]
    fn test_schema_lists_headlines() {
        let schema = report_json_schema();
        let headlines = schema["properties"]["headline"]["enum"].as_array().unwrap();
        assert_eq!(headlines.len(), 3);
        assert!(headlines.contains(&json!("Bio-Age Optimized")));
        assert_eq!(schema["properties"]["findings"]["maxItems"], 2);
    }
}
