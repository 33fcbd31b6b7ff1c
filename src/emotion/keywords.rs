//! Keyword-based emotion classification.
//!
//! Each emotion owns a keyword list; a text scores one point per keyword that
//! appears anywhere in it (case-insensitive substring test, so repeats count
//! once). No model files, always available.

use super::{Classification, ClassifierUnavailable, EmotionClassifier, EmotionLabel};

/// Keyword table. Declaration order doubles as the tie-break order.
static EMOTION_KEYWORDS: &[(EmotionLabel, &[&str])] = &[
    (
        EmotionLabel::Joy,
        &[
            "happy", "joyful", "excited", "cheerful", "glad", "delighted", "elated", "content",
            "thrilled", "ecstatic", "blissful", "pleased", "wonderful", "fantastic", "great",
            "amazing", "awesome", "brilliant", "excellent",
        ],
    ),
    (
        EmotionLabel::Sadness,
        &[
            "sad", "depressed", "down", "unhappy", "melancholy", "gloomy", "miserable",
            "heartbroken", "sorrowful", "dejected", "disappointed", "hurt", "upset", "blue",
            "low", "terrible", "awful", "bad",
        ],
    ),
    (
        EmotionLabel::Anger,
        &[
            "angry", "furious", "mad", "irritated", "annoyed", "frustrated", "rage", "outraged",
            "livid", "irate", "enraged", "indignant", "incensed", "pissed", "hostile",
        ],
    ),
    (
        EmotionLabel::Fear,
        &[
            "scared", "afraid", "anxious", "worried", "nervous", "terrified", "panicked",
            "frightened", "fearful", "apprehensive", "concerned", "uneasy", "distressed",
            "alarmed",
        ],
    ),
    (
        EmotionLabel::Surprise,
        &[
            "surprised", "shocked", "amazed", "astonished", "stunned", "bewildered", "startled",
            "astounded", "flabbergasted", "dumbfounded",
        ],
    ),
    (
        EmotionLabel::Love,
        &[
            "love", "adore", "cherish", "affection", "romantic", "caring", "devoted", "fond",
            "attached", "passionate", "infatuated",
        ],
    ),
    (
        EmotionLabel::Neutral,
        &["okay", "fine", "normal", "regular", "usual", "alright", "decent", "average"],
    ),
];

const BASE_CONFIDENCE: f64 = 0.3;
const CONFIDENCE_PER_HIT: f64 = 0.2;
/// Keyword matching never claims more than this.
pub const MAX_KEYWORD_CONFIDENCE: f64 = 0.8;
const NO_MATCH_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordEmotionClassifier;

impl KeywordEmotionClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Score, label and confidence for `text`. Never fails.
    pub fn detect(&self, text: &str) -> Classification {
        let lowercase_text = text.to_lowercase();

        let mut best: Option<(EmotionLabel, usize)> = None;
        for (label, keywords) in EMOTION_KEYWORDS {
            let score = keywords
                .iter()
                .filter(|kw| lowercase_text.contains(*kw))
                .count();
            if score == 0 {
                continue;
            }
            // Strictly greater keeps the first maximal entry.
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((*label, score));
            }
        }

        match best {
            Some((label, score)) => {
                let confidence =
                    (score as f64 * CONFIDENCE_PER_HIT + BASE_CONFIDENCE).min(MAX_KEYWORD_CONFIDENCE);
                Classification::new(label, confidence)
            }
            None => Classification::new(EmotionLabel::Neutral, NO_MATCH_CONFIDENCE),
        }
    }
}

impl EmotionClassifier for KeywordEmotionClassifier {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn classify(&self, text: &str) -> Result<Classification, ClassifierUnavailable> {
        Ok(self.detect(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joy_keywords() {
        let result = KeywordEmotionClassifier::new().detect("I am so happy and excited today");
        assert_eq!(result.label, EmotionLabel::Joy);
        assert!(result.confidence > 0.5);
        assert!(result.confidence < 1.0);
    }

    #[test]
    fn test_no_keywords_is_neutral() {
        let result = KeywordEmotionClassifier::new().detect("nothing particular happened");
        assert_eq!(result, Classification::new(EmotionLabel::Neutral, 0.5));
    }

    #[test]
    fn test_case_insensitive() {
        let result = KeywordEmotionClassifier::new().detect("I'm FURIOUS and ANNOYED");
        assert_eq!(result.label, EmotionLabel::Anger);
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        let classifier = KeywordEmotionClassifier::new();
        let once = classifier.detect("scared");
        let thrice = classifier.detect("scared scared scared");
        assert_eq!(once.confidence, thrice.confidence);
    }

    #[test]
    fn test_tie_goes_to_first_declared_emotion() {
        // One sadness hit and one fear hit: sadness is declared first.
        let result = KeywordEmotionClassifier::new().detect("sad and worried");
        assert_eq!(result.label, EmotionLabel::Sadness);
    }

    #[test]
    fn test_confidence_is_capped() {
        let result = KeywordEmotionClassifier::new()
            .detect("happy joyful excited cheerful glad delighted thrilled");
        assert_eq!(result.label, EmotionLabel::Joy);
        assert_eq!(result.confidence, MAX_KEYWORD_CONFIDENCE);
    }

    #[test]
    fn test_confidence_grows_with_hits() {
        let classifier = KeywordEmotionClassifier::new();
        let one = classifier.detect("I adore this");
        let two = classifier.detect("I adore and cherish this");
        assert!(two.confidence > one.confidence);
    }
}
