use crate::classifier::normalize_label;
use crate::error::CapabilityError;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Generic category terms the built-in curation removes
pub const DEFAULT_CURATION_BLOCKLIST: &[&str] = &[
    "structure",
    "system",
    "machine",
    "equipment",
    "object",
    "material",
    "device",
    "architecture",
    "electronics",
    "consumer_electronics",
    "bathroom",
    "interior",
    "room",
    "textile",
    "adult",
    "people",
    "conveyance",
    "elevator",
    "appliance",
];

/// Semantic filter over raw scan labels.
///
/// Implementations may drop, merge or re-case labels. An empty result is a
/// valid answer meaning "nothing worth quizzing".
#[async_trait]
pub trait ObjectCuration: Send + Sync {
    async fn curate(&self, labels: &[String]) -> Result<Vec<String>, CapabilityError>;

    fn name(&self) -> &str;
}

/// Run a curation and fold any failure into an empty result
pub async fn curate_or_empty(curation: &dyn ObjectCuration, labels: &[String]) -> Vec<String> {
    match curation.curate(labels).await {
        Ok(curated) => {
            debug!(
                "Curation {} kept {} of {} labels",
                curation.name(),
                curated.len(),
                labels.len()
            );
            curated
        }
        Err(e @ CapabilityError::Unavailable { .. }) => {
            warn!("{}", e);
            Vec::new()
        }
        Err(e) => {
            warn!("Curation {} failed, treating as empty: {}", curation.name(), e);
            Vec::new()
        }
    }
}

/// Deterministic curation: normalize, drop generic terms, keep first occurrence
pub struct BlocklistCuration {
    blocked: HashSet<String>,
}

impl BlocklistCuration {
    pub fn new<I, S>(blocked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            blocked: blocked
                .into_iter()
                .map(|label| normalize_label(label.as_ref()))
                .collect(),
        }
    }

    pub fn is_blocked(&self, label: &str) -> bool {
        self.blocked.contains(&normalize_label(label))
    }
}

impl Default for BlocklistCuration {
    fn default() -> Self {
        Self::new(DEFAULT_CURATION_BLOCKLIST)
    }
}

#[async_trait]
impl ObjectCuration for BlocklistCuration {
    async fn curate(&self, labels: &[String]) -> Result<Vec<String>, CapabilityError> {
        let mut seen = HashSet::new();
        let curated = labels
            .iter()
            .map(|label| normalize_label(label))
            .filter(|label| !label.is_empty() && !self.blocked.contains(label))
            .filter(|label| seen.insert(label.clone()))
            .collect();
        Ok(curated)
    }

    fn name(&self) -> &str {
        "blocklist"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingCuration;

    #[async_trait]
    impl ObjectCuration for FailingCuration {
        async fn curate(&self, _labels: &[String]) -> Result<Vec<String>, CapabilityError> {
            Err(CapabilityError::Unavailable {
                capability: "curation",
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_blocklist_curation_filters_and_dedupes() {
        let curation = BlocklistCuration::default();
        let curated = curation
            .curate(&labels(&["Chair", "structure", " cup ", "chair", "Appliance", "book"]))
            .await
            .unwrap();

        assert_eq!(curated, labels(&["chair", "cup", "book"]));
    }

    #[tokio::test]
    async fn test_curation_of_nothing_is_nothing() {
        let curation = BlocklistCuration::default();
        assert!(curate_or_empty(&curation, &[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_curation_becomes_empty() {
        let curated = curate_or_empty(&FailingCuration, &labels(&["chair"])).await;
        assert!(curated.is_empty());
    }

    #[test]
    fn test_is_blocked_ignores_case() {
        let curation = BlocklistCuration::new(["Device"]);
        assert!(curation.is_blocked("DEVICE"));
        assert!(!curation.is_blocked("cup"));
    }
}
