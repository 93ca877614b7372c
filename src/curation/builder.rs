use super::language::TargetLanguage;
use super::translator::Translator;
use crate::classifier::normalize_label;
use crate::quiz::QuizItem;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns curated labels into quiz items.
///
/// Labels are cleaned against a blocklist, translated one at a time and
/// optionally shuffled. Labels that fail to translate are left out, so the
/// result can be shorter than the input.
pub struct QuizBuilder {
    translator: Arc<dyn Translator>,
    blocked: HashSet<String>,
    shuffle: bool,
}

impl QuizBuilder {
    pub fn new<I, S>(translator: Arc<dyn Translator>, blocked: I, shuffle: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            translator,
            blocked: blocked
                .into_iter()
                .map(|label| normalize_label(label.as_ref()))
                .collect(),
            shuffle,
        }
    }

    /// Lowercase, drop blocked or blank labels, keep the first of any duplicates
    pub fn clean(&self, labels: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        labels
            .iter()
            .map(|label| normalize_label(label))
            .filter(|label| !label.is_empty() && !self.blocked.contains(label))
            .filter(|label| seen.insert(label.clone()))
            .collect()
    }

    pub async fn build(&self, labels: &[String], language: TargetLanguage) -> Vec<QuizItem> {
        let cleaned = self.clean(labels);
        if cleaned.is_empty() {
            debug!("No quiz-worthy labels among {} curated labels", labels.len());
            return Vec::new();
        }

        if !self.translator.is_available() {
            warn!("Translator {} is unavailable", self.translator.name());
            return Vec::new();
        }

        let mut items = Vec::with_capacity(cleaned.len());
        for label in cleaned {
            match self.translator.translate(&label, language).await {
                Ok(prompt) if !prompt.trim().is_empty() => items.push(QuizItem::new(prompt, label)),
                Ok(_) => debug!("Empty translation for '{}', skipping", label),
                Err(e) => debug!("Skipping '{}': {}", label, e),
            }
        }

        if self.shuffle {
            items.shuffle(&mut rand::thread_rng());
        }

        info!(
            "Built {} quiz items in {} {}",
            items.len(),
            language.flag(),
            language.display_name()
        );
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curation::DictionaryTranslator;
    use crate::error::CapabilityError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTranslator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for CountingTranslator {
        async fn translate(
            &self,
            label: &str,
            _language: TargetLanguage,
        ) -> Result<String, CapabilityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(label.to_uppercase())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct OfflineTranslator;

    #[async_trait]
    impl Translator for OfflineTranslator {
        async fn translate(
            &self,
            _label: &str,
            _language: TargetLanguage,
        ) -> Result<String, CapabilityError> {
            Err(CapabilityError::Unavailable {
                capability: "translation",
            })
        }

        fn is_available(&self) -> bool {
            false
        }

        fn name(&self) -> &str {
            "offline"
        }
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clean_applies_blocklist() {
        let builder = QuizBuilder::new(
            Arc::new(DictionaryTranslator::builtin()),
            ["furniture", "electronics"],
            false,
        );
        let cleaned = builder.clean(&labels(&["Chair", "furniture", "CHAIR", " ", "Electronics", "cup"]));
        assert_eq!(cleaned, labels(&["chair", "cup"]));
    }

    #[tokio::test]
    async fn test_build_drops_untranslatable_labels() {
        let builder = QuizBuilder::new(Arc::new(DictionaryTranslator::builtin()), Vec::<String>::new(), false);
        let items = builder
            .build(&labels(&["chair", "flux capacitor", "table"]), TargetLanguage::French)
            .await;

        let pairs: Vec<_> = items
            .iter()
            .map(|item| (item.prompt(), item.expected_label()))
            .collect();
        assert_eq!(pairs, vec![("chaise", "chair"), ("table", "table")]);
    }

    #[tokio::test]
    async fn test_empty_input_never_reaches_translator() {
        let translator = Arc::new(CountingTranslator {
            calls: AtomicUsize::new(0),
        });
        let builder = QuizBuilder::new(translator.clone(), ["object"], true);

        assert!(builder.build(&[], TargetLanguage::German).await.is_empty());
        assert!(builder.build(&labels(&["object"]), TargetLanguage::German).await.is_empty());
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_translator_yields_nothing() {
        let builder = QuizBuilder::new(Arc::new(OfflineTranslator), Vec::<String>::new(), false);
        assert!(builder.build(&labels(&["cup"]), TargetLanguage::Spanish).await.is_empty());
    }

    #[tokio::test]
    async fn test_shuffle_keeps_every_item() {
        let translator = Arc::new(CountingTranslator {
            calls: AtomicUsize::new(0),
        });
        let builder = QuizBuilder::new(translator, Vec::<String>::new(), true);
        let input = labels(&["a", "b", "c", "d", "e", "f"]);

        let items = builder.build(&input, TargetLanguage::French).await;
        let mut expected: Vec<_> = items.iter().map(|i| i.expected_label().to_string()).collect();
        expected.sort();
        assert_eq!(expected, input);
    }
}
