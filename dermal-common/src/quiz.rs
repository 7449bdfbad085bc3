//! Quiz answers and the analyze request body

use crate::image::is_image_data_url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Answers from the 3-step intake quiz
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswers {
    #[serde(default)]
    pub genetic_aging_pattern: Option<String>,
    #[serde(default)]
    pub environmental_exposure: Option<String>,
    #[serde(default)]
    pub skin_state_on_waking: Option<String>,
}

impl QuizAnswers {
    /// Lenient decode: non-string fields become `None`
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            genetic_aging_pattern: field("geneticAgingPattern"),
            environmental_exposure: field("environmentalExposure"),
            skin_state_on_waking: field("skinStateOnWaking"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.genetic_aging_pattern.is_none()
            && self.environmental_exposure.is_none()
            && self.skin_state_on_waking.is_none()
    }
}

/// Body of `POST /api/analyze`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub quiz: QuizAnswers,
    /// `data:image/...` URL of the face photo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(quiz: QuizAnswers, image: Option<String>) -> Self {
        Self { quiz, image }
    }

    /// Normalize a raw request body
    ///
    /// Never fails: malformed or absent JSON yields an all-null quiz, and
    /// image strings without the `data:image` prefix are dropped.
    pub fn from_body(body: &[u8]) -> Self {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(_) => return Self::default(),
        };

        let quiz = match value.get("quiz") {
            Some(quiz) if quiz.is_object() => QuizAnswers::from_value(quiz),
            _ => QuizAnswers::default(),
        };
        let image = value
            .get("image")
            .and_then(Value::as_str)
            .filter(|image| is_image_data_url(image))
            .map(str::to_string);

        Self { quiz, image }
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// One intake quiz question
#[derive(Debug, Clone, Copy)]
pub struct QuizMetric {
    pub step: u8,
    pub label: &'static str,
    pub title: &'static str,
    pub question: &'static str,
    pub options: &'static [&'static str],
}

impl QuizMetric {
    pub fn accepts(&self, answer: &str) -> bool {
        self.options.contains(&answer)
    }
}

pub const QUIZ_METRICS: [QuizMetric; 3] = [
    QuizMetric {
        step: 1,
        label: "METRIC 01",
        title: "Genetic History & Vulnerability",
        question: "Which aging pattern is most prominent in your biological lineage?",
        options: &[
            "Sagging/Volume Loss",
            "Deep Static Lines",
            "Hyperpigmentation",
            "Texture/Elasticity",
        ],
    },
    QuizMetric {
        step: 2,
        label: "METRIC 02",
        title: "Cellular Stress Profile",
        question: "Average daily exposure to environmental pollutants and screen radiation?",
        options: &["Heavy (Urban/Office)", "Moderate", "Low (Controlled)"],
    },
    QuizMetric {
        step: 3,
        label: "METRIC 03",
        title: "Dermal Recovery Cycles",
        question: "Identify your skin's state upon waking from rest.",
        options: &[
            "Oily/Congested",
            "Taut/Parched",
            "Dull/Fatigued",
            "Balanced/Refreshed",
        ],
    },
];
