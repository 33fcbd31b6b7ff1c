//! Emotion detection core.
//!
//! Free text is classified into one of seven fixed emotion labels, scored for
//! sentiment polarity, and folded into a bounded intensity value. A trained
//! TF-IDF classifier is used when its artifacts load; the keyword classifier
//! covers everything else.

pub mod artifacts;
pub mod detector;
pub mod keywords;
pub mod sentiment;
pub mod trained;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

use crate::error::CoreError;

pub use detector::EmotionDetectionService;
pub use keywords::KeywordEmotionClassifier;
pub use sentiment::SentimentScorer;
pub use trained::TrainedEmotionClassifier;

/// The closed emotion taxonomy. Declaration order is the ordinal order used
/// when a classifier emits bare class indices.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Love,
    Neutral,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Joy,
        EmotionLabel::Sadness,
        EmotionLabel::Anger,
        EmotionLabel::Fear,
        EmotionLabel::Surprise,
        EmotionLabel::Love,
        EmotionLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Joy => "joy",
            EmotionLabel::Sadness => "sadness",
            EmotionLabel::Anger => "anger",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Love => "love",
            EmotionLabel::Neutral => "neutral",
        }
    }

    /// Label for a class index in declaration order.
    pub fn from_ordinal(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn category(&self) -> EmotionCategory {
        match self {
            EmotionLabel::Joy | EmotionLabel::Love | EmotionLabel::Surprise => {
                EmotionCategory::Positive
            }
            EmotionLabel::Sadness | EmotionLabel::Anger | EmotionLabel::Fear => {
                EmotionCategory::Negative
            }
            EmotionLabel::Neutral => EmotionCategory::Neutral,
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|label| label.as_str() == normalized)
            .copied()
            .ok_or_else(|| CoreError::UnknownLabel(s.to_string()))
    }
}

/// Coarse valence grouping used by the emotional-balance view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
pub enum EmotionCategory {
    Positive,
    Negative,
    Neutral,
}

impl EmotionCategory {
    pub const ALL: [EmotionCategory; 3] = [
        EmotionCategory::Positive,
        EmotionCategory::Negative,
        EmotionCategory::Neutral,
    ];
}

/// A single-label classifier decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: EmotionLabel,
    pub confidence: f64,
}

impl Classification {
    pub fn new(label: EmotionLabel, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

/// Raised by a classifier that cannot answer for this input; the detector
/// falls back to the keyword classifier for that call only.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("classifier unavailable: {reason}")]
pub struct ClassifierUnavailable {
    pub reason: String,
}

impl ClassifierUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Capability every emotion classifier provides.
pub trait EmotionClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn classify(&self, text: &str) -> Result<Classification, ClassifierUnavailable>;
}

/// Output of one detection call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmotionReading {
    pub emotion: EmotionLabel,
    /// Belief in the chosen label, 0..=1
    pub confidence: f64,
    /// Polarity, -1..=1
    pub sentiment: f64,
    /// Derived from confidence and polarity, 0..=1
    pub intensity: f64,
}

impl EmotionReading {
    /// Reading used for empty input.
    pub fn neutral() -> Self {
        Self {
            emotion: EmotionLabel::Neutral,
            confidence: 0.5,
            sentiment: 0.0,
            intensity: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse_is_case_insensitive() {
        assert_eq!("Joy".parse::<EmotionLabel>().unwrap(), EmotionLabel::Joy);
        assert_eq!(" SADNESS ".parse::<EmotionLabel>().unwrap(), EmotionLabel::Sadness);
        assert!("boredom".parse::<EmotionLabel>().is_err());
    }

    #[test]
    fn test_ordinal_table_follows_declaration_order() {
        assert_eq!(EmotionLabel::from_ordinal(0), Some(EmotionLabel::Joy));
        assert_eq!(EmotionLabel::from_ordinal(6), Some(EmotionLabel::Neutral));
        assert_eq!(EmotionLabel::from_ordinal(7), None);
    }

    #[test]
    fn test_categories() {
        assert_eq!(EmotionLabel::Surprise.category(), EmotionCategory::Positive);
        assert_eq!(EmotionLabel::Fear.category(), EmotionCategory::Negative);
        assert_eq!(EmotionLabel::Neutral.category(), EmotionCategory::Neutral);
    }

    #[test]
    fn test_label_serializes_lowercase() {
        let json = serde_json::to_string(&EmotionLabel::Love).unwrap();
        assert_eq!(json, "\"love\"");
    }
}
