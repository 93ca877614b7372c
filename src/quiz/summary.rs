use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreGrade {
    Perfect,
    Good,
    KeepPracticing,
}

impl ScoreGrade {
    pub fn from_score(score: usize, total: usize) -> Self {
        if total > 0 && score >= total {
            ScoreGrade::Perfect
        } else if total > 0 && score as f64 / total as f64 >= 0.7 {
            ScoreGrade::Good
        } else {
            ScoreGrade::KeepPracticing
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ScoreGrade::Perfect => "Perfect score!",
            ScoreGrade::Good => "Great job!",
            ScoreGrade::KeepPracticing => "Keep practicing!",
        }
    }
}

impl fmt::Display for ScoreGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// How one question went
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub prompt: String,
    pub expected_label: String,
    pub correct: bool,
    pub revealed: bool,
    pub attempts: u32,
}

/// Final result of a completed quiz session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSummary {
    pub score: usize,
    pub total: usize,
    pub grade: ScoreGrade,
    pub outcomes: Vec<QuestionOutcome>,
    pub completed_at: DateTime<Utc>,
}

impl QuizSummary {
    pub fn new(score: usize, outcomes: Vec<QuestionOutcome>) -> Self {
        let total = outcomes.len();
        Self {
            score,
            total,
            grade: ScoreGrade::from_score(score, total),
            outcomes,
            completed_at: Utc::now(),
        }
    }

    /// Score as a whole percentage
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.score as f64 / self.total as f64) * 100.0).round() as u32
    }
}
