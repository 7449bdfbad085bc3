//! Fallback content for failed analyses
//!
//! One `FallbackPolicy` value holds every canned artifact: the server's
//! replacement log lines, the replacement report, and the client's
//! synthetic completion line. Services take the policy by value so tests
//! can inject alternates.

use crate::log_line::{LogLine, TAG_FINDING};
use crate::report::{
    generate_profile_id, DermalReport, Finding, FindingIcon, Headline, Inflammation, Metrics,
    Trend, TrendMetric,
};

/// Profile id of the canned report
pub const FALLBACK_PROFILE_ID: &str = "SK-77202";

/// Message of the client's synthetic completion line
pub const FALLBACK_COMPLETE_MESSAGE: &str = "FALLBACK_ANALYSIS_COMPLETE";

const FALLBACK_LOG_LINES: [&str; 8] = [
    "08:34:51 [OK] AUTHENTICATING_BIOMETRIC_ENCRYPTION",
    "08:34:51 [OK] UV_SPECTRUM_MAPPING_INITIALIZED",
    "08:34:51 [..] ANALYZING_NASOLABIAL_VECTORS",
    "08:34:52 [..] DETECTING_SUB_DURMAL_INFLAMMATION",
    "08:34:52 [!!] IRREGULAR_COLLAGEN_PATTERN_DETECTED",
    "08:34:52 [OK] CROSS_REF_GENETIC_PROFILE_ID_7",
    "08:34:53 [OK] BARRIER_INTEGRITY_INDEX_FINALIZED",
    "08:34:53 [..] CALCULATING_BIO_AGE_VARIANCE",
];

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPolicy {
    /// Log lines streamed when the log phase fails before emitting anything
    pub log_lines: Vec<String>,
    /// Canned report (always schema-valid)
    pub report: DermalReport,
    /// Server-side fallback reports get a fresh random profile id
    pub randomize_profile_id: bool,
    /// Line the client appends when the transport fails
    pub completion_line: LogLine,
}

impl FallbackPolicy {
    pub fn standard() -> Self {
        Self {
            log_lines: FALLBACK_LOG_LINES.iter().map(|s| s.to_string()).collect(),
            report: standard_report(),
            randomize_profile_id: true,
            completion_line: LogLine::new("08:34:53", TAG_FINDING, FALLBACK_COMPLETE_MESSAGE),
        }
    }

    /// Report emitted by the server in place of model output
    pub fn server_report(&self) -> DermalReport {
        if self.randomize_profile_id {
            self.report.with_profile_id(generate_profile_id())
        } else {
            self.report.clone()
        }
    }

    /// Report persisted by the client when the request itself fails
    pub fn client_report(&self) -> DermalReport {
        self.report.clone()
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_report() -> DermalReport {
    DermalReport {
        profile_id: FALLBACK_PROFILE_ID.to_string(),
        headline: Headline::Accelerated,
        description: "Structural fragmentation detected in the deep dermal layer. Your skin's \
                      biological age is currently outpacing your chronological age by 4.2 years."
            .to_string(),
        bio_age_variance: "+4.2y".to_string(),
        metrics: Metrics {
            uv_damage: TrendMetric::new(62.0, Trend::Up),
            hydration: TrendMetric::new(38.0, Trend::Down),
            inflammation: Inflammation::High,
            dermal_bio_age: "+4.2y".to_string(),
        },
        findings: vec![
            Finding {
                id: "dermal-thinning".to_string(),
                title: "Dermal Thinning".to_string(),
                icon: FindingIcon::Warning,
                description: "The AI detected early-stage collagen breakdown in the periocular \
                              region. Without intervention, surface creasing will increase by 22% \
                              in the next 14 months."
                    .to_string(),
            },
            Finding {
                id: "lipid-loss".to_string(),
                title: "Lipid Loss".to_string(),
                icon: FindingIcon::Alert,
                description: "Your hydration retention markers are at critical lows. This \
                              indicates a 'leaky' skin barrier, allowing environmental toxins to \
                              penetrate deeper than normal."
                    .to_string(),
            },
        ],
    }
}
