//! Trained TF-IDF + linear classifier.
//!
//! The three parts (vectorizer, classifier, optional label decoder) are
//! exported from a training pipeline as JSON and checked against each other
//! when the classifier is built, so a constructed classifier can always run.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;

use super::{Classification, ClassifierUnavailable, EmotionClassifier, EmotionLabel};
use crate::error::ArtifactError;

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("static token pattern"));

fn default_true() -> bool {
    true
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

/// TF-IDF vectorizer with a fixed vocabulary.
#[derive(Debug, Clone, Deserialize)]
pub struct TfidfVectorizer {
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f64>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub sublinear_tf: bool,
}

impl TfidfVectorizer {
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.idf.is_empty() {
            return Err(ArtifactError::Inconsistent("vectorizer has no idf weights".into()));
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ArtifactError::Inconsistent(format!(
                "invalid ngram range ({}, {})",
                min_n, max_n
            )));
        }
        if let Some((term, column)) = self
            .vocabulary
            .iter()
            .find(|(_, column)| **column >= self.idf.len())
        {
            return Err(ArtifactError::Inconsistent(format!(
                "vocabulary term {:?} maps to column {} but only {} idf weights exist",
                term,
                column,
                self.idf.len()
            )));
        }
        Ok(())
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let words: Vec<&str> = TOKEN_PATTERN.find_iter(&text).map(|m| m.as_str()).collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > words.len() {
                break;
            }
            terms.extend(words.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    /// L2-normalised sparse TF-IDF vector as `(column, weight)` pairs.
    pub fn transform(&self, text: &str) -> Vec<(usize, f64)> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.tokenize(text) {
            if let Some(&column) = self.vocabulary.get(&term) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        let mut features: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(column, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (column, tf * self.idf[column])
            })
            .collect();
        features.sort_by_key(|(column, _)| *column);

        let norm = features.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut features {
                *w /= norm;
            }
        }
        features
    }
}

/// A class value as emitted by the training pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ClassValue {
    Index(usize),
    Name(String),
}

/// Multinomial linear model (softmax over `coef · x + intercept`).
#[derive(Debug, Clone, Deserialize)]
pub struct LinearClassifier {
    pub classes: Vec<ClassValue>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LinearClassifier {
    fn is_binary(&self) -> bool {
        self.coef.len() == 1 && self.classes.len() == 2
    }

    fn validate(&self, n_features: usize) -> Result<(), ArtifactError> {
        if self.classes.len() < 2 {
            return Err(ArtifactError::Inconsistent("classifier needs at least two classes".into()));
        }
        if !self.is_binary() && self.coef.len() != self.classes.len() {
            return Err(ArtifactError::Inconsistent(format!(
                "{} coefficient rows for {} classes",
                self.coef.len(),
                self.classes.len()
            )));
        }
        if self.intercept.len() != self.coef.len() {
            return Err(ArtifactError::Inconsistent(format!(
                "{} intercepts for {} coefficient rows",
                self.intercept.len(),
                self.coef.len()
            )));
        }
        if let Some(row) = self.coef.iter().find(|row| row.len() != n_features) {
            return Err(ArtifactError::Inconsistent(format!(
                "coefficient row has {} weights, vectorizer produces {} features",
                row.len(),
                n_features
            )));
        }
        Ok(())
    }

    /// Class probabilities, aligned with `classes`.
    pub fn predict_proba(&self, features: &[(usize, f64)]) -> Vec<f64> {
        let scores: Vec<f64> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, bias)| bias + features.iter().map(|(col, w)| row[*col] * w).sum::<f64>())
            .collect();

        if self.is_binary() {
            let positive = 1.0 / (1.0 + (-scores[0]).exp());
            return vec![1.0 - positive, positive];
        }

        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    }
}

/// Maps integer class values back to label names.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelDecoder {
    pub classes: Vec<String>,
}

pub struct TrainedEmotionClassifier {
    vectorizer: TfidfVectorizer,
    classifier: LinearClassifier,
    decoder: Option<LabelDecoder>,
}

impl TrainedEmotionClassifier {
    /// Check the parts against each other. A decoder naming anything outside
    /// the seven supported emotions rejects the whole model.
    pub fn new(
        vectorizer: TfidfVectorizer,
        classifier: LinearClassifier,
        decoder: Option<LabelDecoder>,
    ) -> Result<Self, ArtifactError> {
        vectorizer.validate()?;
        classifier.validate(vectorizer.n_features())?;

        if let Some(decoder) = &decoder {
            for class in &decoder.classes {
                if class.parse::<EmotionLabel>().is_err() {
                    return Err(ArtifactError::LabelMismatch(class.clone()));
                }
            }
            for class in &classifier.classes {
                if let ClassValue::Index(index) = class {
                    if *index >= decoder.classes.len() {
                        return Err(ArtifactError::Inconsistent(format!(
                            "class index {} has no entry in the label decoder ({} classes)",
                            index,
                            decoder.classes.len()
                        )));
                    }
                }
            }
        }

        Ok(Self {
            vectorizer,
            classifier,
            decoder,
        })
    }

    pub fn has_decoder(&self) -> bool {
        self.decoder.is_some()
    }

    fn decode(&self, class: &ClassValue) -> EmotionLabel {
        let raw = match (class, &self.decoder) {
            (ClassValue::Index(index), Some(decoder)) => decoder.classes[*index].clone(),
            (ClassValue::Index(index), None) => match EmotionLabel::from_ordinal(*index) {
                Some(label) => return label,
                None => index.to_string(),
            },
            (ClassValue::Name(name), _) => name.clone(),
        };

        raw.parse().unwrap_or_else(|_| {
            tracing::warn!("⚠️ Model predicted unsupported label {:?}, recording as neutral", raw);
            EmotionLabel::Neutral
        })
    }
}

impl EmotionClassifier for TrainedEmotionClassifier {
    fn name(&self) -> &'static str {
        "tfidf-linear"
    }

    fn classify(&self, text: &str) -> Result<Classification, ClassifierUnavailable> {
        let features = self.vectorizer.transform(text.trim());
        let probabilities = self.classifier.predict_proba(&features);

        let (best, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, p)| match best {
                Some((_, top)) if top >= p => best,
                _ => Some((i, p)),
            })
            .ok_or_else(|| ClassifierUnavailable::new("model produced no probabilities"))?;

        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(ClassifierUnavailable::new(format!(
                "model produced invalid probability {}",
                confidence
            )));
        }

        let label = self.decode(&self.classifier.classes[best]);
        tracing::debug!("Model prediction: {} (confidence: {:.3})", label, confidence);
        Ok(Classification::new(label, confidence))
    }
}
