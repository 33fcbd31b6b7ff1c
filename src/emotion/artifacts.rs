//! Discovery and loading of trained classifier artifacts.
//!
//! Artifacts live in a single directory under one of a few conventional
//! filenames. Loading is best effort: anything missing or broken leaves the
//! service in keyword-only mode.

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use super::trained::{LabelDecoder, LinearClassifier, TfidfVectorizer, TrainedEmotionClassifier};
use crate::error::ArtifactError;

pub const CLASSIFIER_FILES: &[&str] = &[
    "emotion_model.json",
    "emotion_classifier.json",
    "sentiment_model.json",
    "text_classifier.json",
    "model.json",
];

pub const VECTORIZER_FILES: &[&str] = &[
    "emotion_vectorizer.json",
    "tfidf_vectorizer.json",
    "text_vectorizer.json",
    "vectorizer.json",
];

pub const LABEL_DECODER_FILES: &[&str] = &[
    "label_encoder.json",
    "emotion_label_encoder.json",
    "encoder.json",
];

/// Paths found for each artifact kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveredArtifacts {
    pub classifier: Option<PathBuf>,
    pub vectorizer: Option<PathBuf>,
    pub label_decoder: Option<PathBuf>,
}

impl DiscoveredArtifacts {
    pub fn is_complete(&self) -> bool {
        self.classifier.is_some() && self.vectorizer.is_some()
    }
}

fn first_existing(dir: &Path, candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Locate artifacts in `dir` by the first matching candidate filename.
pub fn discover(dir: &Path) -> DiscoveredArtifacts {
    DiscoveredArtifacts {
        classifier: first_existing(dir, CLASSIFIER_FILES),
        vectorizer: first_existing(dir, VECTORIZER_FILES),
        label_decoder: first_existing(dir, LABEL_DECODER_FILES),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, kind: &'static str) -> Result<T, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let parsed = serde_json::from_str(&raw).map_err(|source| ArtifactError::Malformed {
        kind,
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!("📦 Loaded {} from {}", kind, path.display());
    Ok(parsed)
}

/// Load and cross-check the artifacts in `dir`.
pub fn try_load(dir: &Path) -> Result<TrainedEmotionClassifier, ArtifactError> {
    let found = discover(dir);

    let vectorizer_path = found.vectorizer.ok_or(ArtifactError::Missing("vectorizer"))?;
    let classifier_path = found.classifier.ok_or(ArtifactError::Missing("classifier"))?;

    let vectorizer: TfidfVectorizer = read_json(&vectorizer_path, "vectorizer")?;
    let classifier: LinearClassifier = read_json(&classifier_path, "classifier")?;
    let decoder: Option<LabelDecoder> = match found.label_decoder {
        Some(path) => Some(read_json(&path, "label decoder")?),
        None => None,
    };

    TrainedEmotionClassifier::new(vectorizer, classifier, decoder)
}

/// Best-effort load: failures are logged and yield `None`.
pub fn load_trained_classifier(dir: &Path) -> Option<TrainedEmotionClassifier> {
    match try_load(dir) {
        Ok(model) => {
            tracing::info!(
                "🧠 Trained emotion classifier ready (label decoder: {})",
                model.has_decoder()
            );
            Some(model)
        }
        Err(ArtifactError::Missing(kind)) => {
            tracing::warn!(
                "⚠️ No {} artifact in {}. Using keyword emotion detection.",
                kind,
                dir.display()
            );
            None
        }
        Err(e) => {
            tracing::warn!("⚠️ Ignoring classifier artifacts in {}: {}", dir.display(), e);
            None
        }
    }
}
