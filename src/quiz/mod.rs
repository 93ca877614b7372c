mod engine;
mod item;
mod summary;

#[cfg(test)]
mod tests;

pub use engine::{
    matches_expected, AttemptOutcome, AttemptTicket, IgnoredAttempt, QuizMatchingEngine, QuizPhase,
};
pub use item::QuizItem;
pub use summary::{QuestionOutcome, QuizSummary, ScoreGrade};
