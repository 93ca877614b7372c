use super::interface::{Classifier, Observation};
use crate::error::{ClassifierError, Result};
use crate::frame::FrameData;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

/// One canned classifier response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    /// Ranked results for one frame
    Observations(Vec<Observation>),
    /// Classification fails with this message
    Failure { error: String },
    /// Classification takes this long, then returns nothing
    Stall { stall_ms: u64 },
}

/// Sequence of responses replayed frame by frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierScript {
    pub steps: Vec<ScriptStep>,
    /// Start over after the last step instead of returning empty results
    #[serde(default = "default_repeat")]
    pub repeat: bool,
}

fn default_repeat() -> bool {
    true
}

/// Deterministic classifier that replays a script, one step per call.
///
/// Stands in for an on-device model in tests and demos; the frame content
/// is ignored.
pub struct ScriptedClassifier {
    script: ClassifierScript,
    cursor: AtomicUsize,
    latency: Duration,
    available: bool,
}

impl ScriptedClassifier {
    pub fn new(script: ClassifierScript) -> Self {
        Self {
            script,
            cursor: AtomicUsize::new(0),
            latency: Duration::ZERO,
            available: true,
        }
    }

    /// Script answering every call with the same steps in order, then empty
    pub fn from_steps(steps: Vec<ScriptStep>) -> Self {
        Self::new(ClassifierScript {
            steps,
            repeat: false,
        })
    }

    /// Load a JSON script
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let script: ClassifierScript = serde_json::from_str(&contents)?;
        debug!(
            "Loaded classifier script with {} steps from {}",
            script.steps.len(),
            path.as_ref().display()
        );
        Ok(Self::new(script))
    }

    /// Classifier that reports itself unavailable on every call
    pub fn unavailable() -> Self {
        let mut classifier = Self::from_steps(Vec::new());
        classifier.available = false;
        classifier
    }

    /// Built-in household scene used when no script is configured
    pub fn demo() -> Self {
        let frame = |items: &[(&str, f32)]| {
            ScriptStep::Observations(
                items
                    .iter()
                    .map(|(label, confidence)| Observation::new(*label, *confidence))
                    .collect(),
            )
        };

        Self::new(ClassifierScript {
            steps: vec![
                frame(&[("chair", 0.91), ("person", 0.84), ("cup", 0.52)]),
                frame(&[("chair", 0.88), ("cup", 0.77), ("laptop", 0.41)]),
                frame(&[("chair", 0.93), ("cup", 0.81), ("bottle", 0.74)]),
                frame(&[("cup", 0.79), ("bottle", 0.72), ("furniture", 0.71)]),
                frame(&[("bottle", 0.83), ("laptop", 0.76), ("book", 0.35)]),
                frame(&[]),
                frame(&[("laptop", 0.80), ("book", 0.74), ("furniture", 0.73)]),
                frame(&[("laptop", 0.86), ("book", 0.78), ("furniture", 0.75)]),
                frame(&[("book", 0.81), ("table", 0.71), ("person", 0.62)]),
                frame(&[("table", 0.77), ("chair", 0.70), ("person", 0.90)]),
                frame(&[("table", 0.74), ("person", 0.88)]),
            ],
            repeat: true,
        })
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of classify calls served so far
    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    fn next_step(&self) -> Option<ScriptStep> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        let steps = &self.script.steps;

        if steps.is_empty() {
            return None;
        }

        if self.script.repeat {
            steps.get(index % steps.len()).cloned()
        } else {
            steps.get(index).cloned()
        }
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, frame: &FrameData) -> std::result::Result<Vec<Observation>, ClassifierError> {
        if !self.available {
            return Err(ClassifierError::Unavailable {
                details: "scripted classifier disabled".to_string(),
            });
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let step = self.next_step();
        trace!("Scripted classifier answering frame {} with {:?}", frame.id, step);

        match step {
            Some(ScriptStep::Observations(observations)) => Ok(observations),
            Some(ScriptStep::Failure { error }) => Err(ClassifierError::Inference { details: error }),
            Some(ScriptStep::Stall { stall_ms }) => {
                tokio::time::sleep(Duration::from_millis(stall_ms)).await;
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
