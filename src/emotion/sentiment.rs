//! Sentiment polarity scoring backed by VADER.

use std::panic::{self, AssertUnwindSafe};

use vader_sentiment::SentimentIntensityAnalyzer;

/// Maps text to a polarity in `[-1, 1]`. Best effort: any analyzer failure
/// yields `0.0`.
///
/// A panic inside the analyzer is caught, but it still passes through the
/// process-wide panic hook first, so the default hook prints its message to
/// stderr before the `error!` event is logged. The hook is left alone here
/// since it is global state shared with every other thread.
pub struct SentimentScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl SentimentScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    pub fn score(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }

        let compound = panic::catch_unwind(AssertUnwindSafe(|| {
            self.analyzer
                .polarity_scores(text)
                .get("compound")
                .copied()
        }));

        match compound {
            Ok(Some(value)) if value.is_finite() => value.clamp(-1.0, 1.0),
            Ok(_) => {
                tracing::warn!("⚠️ Sentiment analyzer returned no usable compound score");
                0.0
            }
            Err(_) => {
                tracing::error!("🔥 Sentiment analyzer panicked, scoring as neutral");
                0.0
            }
        }
    }
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new()
    }
}
