use crate::config::{PolicyKind, StabilizerConfig};

/// Rule converting per-frame classifier output into accepted labels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StabilizationPolicy {
    /// Accept a label once it has been seen above the threshold
    /// `required_count` times. Suppresses one-off false positives.
    Locked {
        confidence_threshold: f32,
        required_count: u32,
    },
    /// Accept a label the first time it appears above the threshold among
    /// the top `top_k` results of a frame.
    Candidate {
        confidence_threshold: f32,
        top_k: usize,
    },
}

impl StabilizationPolicy {
    pub fn locked() -> Self {
        StabilizationPolicy::Locked {
            confidence_threshold: 0.70,
            required_count: 3,
        }
    }

    pub fn candidate() -> Self {
        StabilizationPolicy::Candidate {
            confidence_threshold: 0.30,
            top_k: 5,
        }
    }

    /// Build the policy of the given kind from configured thresholds
    pub fn from_config(config: &StabilizerConfig, kind: PolicyKind) -> Self {
        match kind {
            PolicyKind::Locked => StabilizationPolicy::Locked {
                confidence_threshold: config.confidence_threshold_locked,
                required_count: config.required_repeat_count.max(1),
            },
            PolicyKind::Candidate => StabilizationPolicy::Candidate {
                confidence_threshold: config.confidence_threshold_candidate,
                top_k: config.top_k_per_frame.max(1),
            },
        }
    }

    pub fn confidence_threshold(&self) -> f32 {
        match self {
            StabilizationPolicy::Locked {
                confidence_threshold,
                ..
            }
            | StabilizationPolicy::Candidate {
                confidence_threshold,
                ..
            } => *confidence_threshold,
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            StabilizationPolicy::Locked { .. } => PolicyKind::Locked,
            StabilizationPolicy::Candidate { .. } => PolicyKind::Candidate,
        }
    }

    /// Whether a confidence clears this policy's threshold (strictly greater)
    pub fn qualifies(&self, confidence: f32) -> bool {
        confidence > self.confidence_threshold()
    }
}

impl Default for StabilizationPolicy {
    fn default() -> Self {
        Self::locked()
    }
}
