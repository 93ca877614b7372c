use crate::error::ClassifierError;
use crate::frame::FrameData;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One ranked classifier result for a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub label: String,
    /// Probability between 0.0 and 1.0
    pub confidence: f32,
}

impl Observation {
    pub fn new<S: Into<String>>(label: S, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Label in the form used for set membership: trimmed and lowercased
    pub fn normalized_label(&self) -> String {
        normalize_label(&self.label)
    }
}

/// Case-normalize a label for comparison
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Image classifier capability: frame in, ranked (label, confidence) list out.
///
/// Results are ordered highest confidence first and may be empty. Callers
/// treat an error exactly like an empty result.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, frame: &FrameData) -> Result<Vec<Observation>, ClassifierError>;

    /// Name used in logs
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_clamps_confidence() {
        assert_eq!(Observation::new("cup", 1.7).confidence, 1.0);
        assert_eq!(Observation::new("cup", -0.2).confidence, 0.0);
        assert_eq!(Observation::new("cup", 0.42).confidence, 0.42);
    }

    #[test]
    fn test_normalized_label() {
        assert_eq!(Observation::new("  Coffee Mug ", 0.5).normalized_label(), "coffee mug");
        assert_eq!(normalize_label("CHAIR"), "chair");
    }
}
