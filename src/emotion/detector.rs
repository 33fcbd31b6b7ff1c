//! Single entry point for turning a chat message or journal entry into an
//! [`EmotionReading`].

use std::path::Path;

use super::artifacts;
use super::keywords::KeywordEmotionClassifier;
use super::sentiment::SentimentScorer;
use super::{Classification, EmotionClassifier, EmotionLabel, EmotionReading};

/// Fold sentiment polarity into classifier confidence.
///
/// Positive emotions grow with positive polarity, negative emotions grow
/// with negative polarity, the rest keep the raw confidence. Result is
/// clamped to `[0, 1]`.
pub fn intensity(emotion: EmotionLabel, confidence: f64, sentiment: f64) -> f64 {
    let base = confidence;
    let value = match emotion {
        EmotionLabel::Joy | EmotionLabel::Love => base * (1.0 + sentiment * 0.5),
        EmotionLabel::Sadness | EmotionLabel::Anger | EmotionLabel::Fear => {
            base * (1.0 - sentiment * 0.5)
        }
        EmotionLabel::Surprise | EmotionLabel::Neutral => base,
    };
    value.clamp(0.0, 1.0)
}

/// Built once at startup and shared read-only between handlers.
pub struct EmotionDetectionService {
    trained: Option<Box<dyn EmotionClassifier>>,
    fallback: KeywordEmotionClassifier,
    sentiment: SentimentScorer,
}

impl EmotionDetectionService {
    pub fn new(trained: Option<Box<dyn EmotionClassifier>>) -> Self {
        Self {
            trained,
            fallback: KeywordEmotionClassifier::new(),
            sentiment: SentimentScorer::new(),
        }
    }

    /// Keyword classification only.
    pub fn fallback_only() -> Self {
        Self::new(None)
    }

    /// Load trained artifacts from `dir` if present; keyword-only otherwise.
    pub fn from_model_dir(dir: &Path) -> Self {
        let trained = artifacts::load_trained_classifier(dir)
            .map(|model| Box::new(model) as Box<dyn EmotionClassifier>);
        Self::new(trained)
    }

    pub fn has_trained_classifier(&self) -> bool {
        self.trained.is_some()
    }

    /// Name of the classifier used when the trained model answers.
    pub fn active_classifier(&self) -> &'static str {
        self.trained
            .as_ref()
            .map(|model| model.name())
            .unwrap_or_else(|| self.fallback.name())
    }

    fn classify(&self, text: &str) -> Classification {
        if let Some(model) = &self.trained {
            match model.classify(text) {
                Ok(result) => return result,
                Err(e) => tracing::warn!(
                    "⚠️ {} classifier failed ({}), falling back to keywords",
                    model.name(),
                    e
                ),
            }
        }
        self.fallback.detect(text)
    }

    pub fn detect(&self, text: &str) -> EmotionReading {
        if text.trim().is_empty() {
            return EmotionReading::neutral();
        }

        let Classification { label, confidence } = self.classify(text);
        let confidence = confidence.clamp(0.0, 1.0);
        let sentiment = self.sentiment.score(text);

        EmotionReading {
            emotion: label,
            confidence,
            sentiment,
            intensity: intensity(label, confidence, sentiment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::trained::tests::toy_parts;
    use crate::emotion::{ClassifierUnavailable, TrainedEmotionClassifier};

    struct BrokenClassifier;

    impl EmotionClassifier for BrokenClassifier {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn classify(&self, _text: &str) -> Result<Classification, ClassifierUnavailable> {
            Err(ClassifierUnavailable::new("inference failed"))
        }
    }

    #[test]
    fn test_empty_input_is_fixed_neutral() {
        let service = EmotionDetectionService::fallback_only();
        assert_eq!(service.detect(""), EmotionReading::neutral());
        assert_eq!(service.detect("   "), EmotionReading::neutral());
    }

    #[test]
    fn test_keyword_path() {
        let service = EmotionDetectionService::fallback_only();
        let reading = service.detect("I am so happy and excited today");
        assert_eq!(reading.emotion, EmotionLabel::Joy);
        assert!(reading.sentiment > 0.0);
        assert!(reading.intensity >= reading.confidence);
        assert_eq!(service.active_classifier(), "keyword");
    }

    #[test]
    fn test_failed_model_falls_back_per_call() {
        let service = EmotionDetectionService::new(Some(Box::new(BrokenClassifier)));
        let reading = service.detect("I'm terrified and anxious about tomorrow");
        assert_eq!(reading.emotion, EmotionLabel::Fear);
        assert!(service.has_trained_classifier());
    }

    #[test]
    fn test_trained_model_is_preferred() {
        let (v, c, d) = toy_parts();
        let model = TrainedEmotionClassifier::new(v, c, Some(d)).unwrap();
        let service = EmotionDetectionService::new(Some(Box::new(model)));
        // Keywords would say anger; the model only knows "calm".
        let reading = service.detect("I am calm but furious");
        assert_eq!(reading.emotion, EmotionLabel::Neutral);
        assert!(reading.confidence > 0.9);
        assert_eq!(service.active_classifier(), "tfidf-linear");
    }

    #[test]
    fn test_intensity_branches() {
        assert!((intensity(EmotionLabel::Joy, 0.6, 1.0) - 0.9).abs() < 1e-9);
        assert!((intensity(EmotionLabel::Sadness, 0.6, -1.0) - 0.9).abs() < 1e-9);
        assert!((intensity(EmotionLabel::Anger, 0.6, 1.0) - 0.3).abs() < 1e-9);
        assert_eq!(intensity(EmotionLabel::Surprise, 0.6, -1.0), 0.6);
        assert_eq!(intensity(EmotionLabel::Neutral, 0.4, 0.9), 0.4);
    }

    #[test]
    fn test_intensity_is_clamped() {
        assert_eq!(intensity(EmotionLabel::Love, 0.9, 1.0), 1.0);
        assert_eq!(intensity(EmotionLabel::Fear, 1.0, -1.0), 1.0);
        assert_eq!(intensity(EmotionLabel::Joy, 0.0, -1.0), 0.0);
    }
}
