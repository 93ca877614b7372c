use super::policy::StabilizationPolicy;
use crate::classifier::{normalize_label, Classifier, Observation};
use crate::frame::FrameData;
use crate::rate_limiter::RateLimiter;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, trace};

/// A label accepted by the stabilizer.
///
/// Each label appears at most once per scanning session, in the order it
/// was first accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StableLabel {
    pub label: String,
    pub first_seen_order: usize,
}

/// Counters describing what the stabilizer did with its input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StabilizerStats {
    pub frames_submitted: u64,
    pub frames_rate_limited: u64,
    pub classifier_misses: u64,
    pub observations_considered: u64,
    pub labels_accepted: u64,
}

/// Turns noisy ranked classifier output into a de-duplicated label feed.
///
/// Labels are keyed case-insensitively; the emitted `StableLabel` keeps the
/// spelling of the first accepted observation.
pub struct DetectionStabilizer {
    policy: StabilizationPolicy,
    rate_limiter: RateLimiter,
    /// Qualifying sightings per label (locked policy only)
    counts: HashMap<String, u32>,
    accepted: HashSet<String>,
    stable: Vec<StableLabel>,
    stats: StabilizerStats,
}

impl DetectionStabilizer {
    pub fn new(policy: StabilizationPolicy, rate_limiter: RateLimiter) -> Self {
        debug!("Creating detection stabilizer with policy {:?}", policy);

        Self {
            policy,
            rate_limiter,
            counts: HashMap::new(),
            accepted: HashSet::new(),
            stable: Vec::new(),
            stats: StabilizerStats::default(),
        }
    }

    /// Rate-limit, classify and stabilize one frame.
    ///
    /// Rate-limited frames, classifier failures and empty results all yield
    /// an empty vector; none of them is an error for the caller.
    pub async fn submit(
        &mut self,
        frame: &FrameData,
        classifier: &dyn Classifier,
        now: Instant,
    ) -> Vec<StableLabel> {
        self.stats.frames_submitted += 1;

        if !self.rate_limiter.try_admit(now) {
            self.stats.frames_rate_limited += 1;
            trace!("Frame {} dropped by rate limiter", frame.id);
            return Vec::new();
        }

        match classifier.classify(frame).await {
            Ok(observations) if !observations.is_empty() => self.accept(&observations),
            Ok(_) => {
                self.stats.classifier_misses += 1;
                trace!("Classifier {} returned no results for frame {}", classifier.name(), frame.id);
                Vec::new()
            }
            Err(e) => {
                self.stats.classifier_misses += 1;
                debug!("Classifier {} failed on frame {}: {}", classifier.name(), frame.id, e);
                Vec::new()
            }
        }
    }

    /// Apply the policy to one frame's ranked observations.
    ///
    /// Returns newly accepted labels in classifier ranking order.
    pub fn accept(&mut self, observations: &[Observation]) -> Vec<StableLabel> {
        let mut newly_accepted = Vec::new();

        match self.policy {
            StabilizationPolicy::Locked {
                confidence_threshold,
                required_count,
            } => {
                for observation in observations {
                    if observation.confidence <= confidence_threshold {
                        continue;
                    }
                    self.stats.observations_considered += 1;

                    let key = observation.normalized_label();
                    if self.accepted.contains(&key) {
                        continue;
                    }

                    let count = self.counts.entry(key.clone()).or_insert(0);
                    *count += 1;
                    trace!("Label '{}' seen {}/{} times", key, count, required_count);

                    if *count >= required_count {
                        newly_accepted.push(self.record(key, &observation.label));
                    }
                }
            }
            StabilizationPolicy::Candidate {
                confidence_threshold,
                top_k,
            } => {
                for observation in observations.iter().take(top_k) {
                    if observation.confidence <= confidence_threshold {
                        continue;
                    }
                    self.stats.observations_considered += 1;

                    let key = observation.normalized_label();
                    if !self.accepted.contains(&key) {
                        newly_accepted.push(self.record(key, &observation.label));
                    }
                }
            }
        }

        newly_accepted
    }

    fn record(&mut self, key: String, label: &str) -> StableLabel {
        let stable = StableLabel {
            label: label.trim().to_string(),
            first_seen_order: self.stable.len(),
        };

        info!("Stable detection: {}", stable.label);

        self.accepted.insert(key);
        self.stable.push(stable.clone());
        self.stats.labels_accepted += 1;
        stable
    }

    /// Whether a label (any casing) has already been accepted
    pub fn is_accepted(&self, label: &str) -> bool {
        self.accepted.contains(&normalize_label(label))
    }

    /// Qualifying sightings so far for a label not yet locked
    pub fn pending_count(&self, label: &str) -> u32 {
        self.counts.get(&normalize_label(label)).copied().unwrap_or(0)
    }

    /// Every label accepted this session, in acceptance order
    pub fn stable_labels(&self) -> &[StableLabel] {
        &self.stable
    }

    pub fn policy(&self) -> StabilizationPolicy {
        self.policy
    }

    pub fn stats(&self) -> &StabilizerStats {
        &self.stats
    }

    /// Start a new scanning session: forget counts, accepted labels and the rate window
    pub fn reset(&mut self) {
        debug!(
            "Resetting stabilizer ({} labels accepted last session)",
            self.stable.len()
        );
        self.counts.clear();
        self.accepted.clear();
        self.stable.clear();
        self.rate_limiter.reset();
        self.stats = StabilizerStats::default();
    }
}
