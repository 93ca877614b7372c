use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One question: a translated prompt and the label the classifier must report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    id: Uuid,
    prompt: String,
    expected_label: String,
}

impl QuizItem {
    pub fn new<P: Into<String>, L: Into<String>>(prompt: P, expected_label: L) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: prompt.into(),
            expected_label: expected_label.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Text shown to the user, in the target language
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn expected_label(&self) -> &str {
        &self.expected_label
    }
}
