mod interface;
mod scripted;

pub use interface::{normalize_label, Classifier, Observation};
pub use scripted::{ClassifierScript, ScriptStep, ScriptedClassifier};

use crate::config::ClassifierConfig;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the classifier described by the configuration.
///
/// Without a script path the built-in household demo script is used.
pub fn build_classifier(config: &ClassifierConfig) -> Result<Arc<dyn Classifier>> {
    let latency = Duration::from_millis(config.latency_ms);

    let classifier = match &config.script_path {
        Some(path) => {
            info!("Loading classifier script from {}", path);
            ScriptedClassifier::from_file(path)?.with_latency(latency)
        }
        None => {
            info!("No classifier script configured, using built-in demo script");
            ScriptedClassifier::demo().with_latency(latency)
        }
    };

    Ok(Arc::new(classifier))
}
