//! Boundary to the external curation and translation capabilities.
//!
//! Both are black boxes to the quiz engine: they may return fewer items,
//! different casing, or nothing at all. Failures are converted to empty
//! results here so they never reach a session as errors.

mod builder;
mod filter;
mod language;
mod translator;

pub use builder::QuizBuilder;
pub use filter::{curate_or_empty, BlocklistCuration, ObjectCuration};
pub use language::TargetLanguage;
pub use translator::{DictionaryTranslator, Translator};
