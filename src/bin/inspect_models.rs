use anyhow::Result;
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;

use mood_journal::emotion::artifacts::{self, DiscoveredArtifacts};
use mood_journal::emotion::EmotionDetectionService;

fn describe(label: &str, path: &Option<PathBuf>) {
    match path {
        Some(p) => println!("  ✅ {:<14} {}", label, p.display()),
        None => println!("  ❌ {:<14} not found", label),
    }
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    // Usage: inspect_models [MODEL_DIR] [TEXT...]
    let mut args = env::args().skip(1);
    let model_dir = args
        .next()
        .map(PathBuf::from)
        .or_else(|| env::var("MODEL_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let samples: Vec<String> = args.collect();

    println!("🔎 Looking for emotion model artifacts in {}", model_dir.display());
    let found: DiscoveredArtifacts = artifacts::discover(&model_dir);
    describe("classifier", &found.classifier);
    describe("vectorizer", &found.vectorizer);
    describe("label decoder", &found.label_decoder);

    if found.is_complete() {
        if let Err(e) = artifacts::try_load(&model_dir) {
            println!("⚠️ Artifacts found but unusable: {}", e);
        }
    }

    let detector = EmotionDetectionService::from_model_dir(&model_dir);
    println!("🧠 Active classifier: {}", detector.active_classifier());

    let samples = if samples.is_empty() {
        vec![
            "I am so happy and excited today".to_string(),
            "I feel lonely and everything seems pointless".to_string(),
            "nothing particular happened".to_string(),
        ]
    } else {
        samples
    };

    for text in samples {
        let reading = detector.detect(&text);
        println!(
            "\n--- {:?}\n  emotion:    {}\n  confidence: {:.3}\n  sentiment:  {:+.3}\n  intensity:  {:.3}",
            text, reading.emotion, reading.confidence, reading.sentiment, reading.intensity
        );
    }

    Ok(())
}
