use super::item::QuizItem;
use super::summary::{QuestionOutcome, QuizSummary};
use crate::classifier::normalize_label;
use crate::error::QuizError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Where a quiz session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizPhase {
    Loading,
    Ready,
    /// Nothing to quiz; terminal and distinct from `Completed`
    Empty,
    Active { index: usize },
    Completed,
    Abandoned,
}

impl QuizPhase {
    pub fn name(&self) -> &'static str {
        match self {
            QuizPhase::Loading => "loading",
            QuizPhase::Ready => "ready",
            QuizPhase::Empty => "empty",
            QuizPhase::Active { .. } => "active",
            QuizPhase::Completed => "completed",
            QuizPhase::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, QuizPhase::Empty | QuizPhase::Completed | QuizPhase::Abandoned)
    }
}

/// Proof that an attempt was started; needed to resolve it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptTicket {
    pub attempt_id: u64,
    pub question_index: usize,
}

/// Why an attempt request did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredAttempt {
    NotActive,
    InFlight,
    AlreadyCorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Resolved { correct: bool },
    Ignored(IgnoredAttempt),
}

#[derive(Debug, Clone, Default)]
struct QuestionProgress {
    attempts: u32,
    correct: bool,
    revealed: bool,
}

/// Whether `expected` is among `labels`, ignoring case and surrounding whitespace
pub fn matches_expected<I, S>(labels: I, expected: &str) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let expected = normalize_label(expected);
    labels
        .into_iter()
        .any(|label| normalize_label(label.as_ref()) == expected)
}

/// Quiz session state machine.
///
/// Owns the items for one session and adjudicates attempts against
/// detections. At most one attempt is outstanding at a time; the
/// split `begin_attempt`/`resolve_attempt` pair lets the detection run on
/// another task while this engine stays on the coordinating one.
pub struct QuizMatchingEngine {
    phase: QuizPhase,
    items: Vec<QuizItem>,
    progress: Vec<QuestionProgress>,
    score: usize,
    in_flight: Option<AttemptTicket>,
    next_attempt_id: u64,
    summary: Option<QuizSummary>,
}

impl QuizMatchingEngine {
    pub fn new() -> Self {
        Self {
            phase: QuizPhase::Loading,
            items: Vec::new(),
            progress: Vec::new(),
            score: 0,
            in_flight: None,
            next_attempt_id: 1,
            summary: None,
        }
    }

    fn invalid(&self, operation: &'static str) -> QuizError {
        let phase = if self.in_flight.is_some() {
            "waiting on an attempt"
        } else {
            self.phase.name()
        };
        QuizError::InvalidTransition { phase, operation }
    }

    /// Load the items; `Loading -> Ready`, or `Loading -> Empty` when there are none
    pub fn prepare(&mut self, items: Vec<QuizItem>) -> Result<QuizPhase, QuizError> {
        if self.phase != QuizPhase::Loading {
            return Err(self.invalid("prepare"));
        }

        if items.is_empty() {
            info!("Quiz has no items");
            self.phase = QuizPhase::Empty;
            return Ok(self.phase);
        }

        debug!("Quiz prepared with {} items", items.len());
        self.progress = vec![QuestionProgress::default(); items.len()];
        self.items = items;
        self.score = 0;
        self.phase = QuizPhase::Ready;
        Ok(self.phase)
    }

    /// `Ready -> Active(0)`
    pub fn begin(&mut self) -> Result<QuizPhase, QuizError> {
        if self.phase != QuizPhase::Ready {
            return Err(self.invalid("begin"));
        }

        self.phase = QuizPhase::Active { index: 0 };
        Ok(self.phase)
    }

    /// Prepare and begin in one step
    pub fn start(&mut self, items: Vec<QuizItem>) -> Result<QuizPhase, QuizError> {
        if self.phase != QuizPhase::Loading {
            return Err(self.invalid("start"));
        }

        match self.prepare(items)? {
            QuizPhase::Ready => self.begin(),
            phase => Ok(phase),
        }
    }

    /// Reason a new attempt would be ignored right now, if any
    pub fn attempt_blocker(&self) -> Option<IgnoredAttempt> {
        let QuizPhase::Active { index } = self.phase else {
            return Some(IgnoredAttempt::NotActive);
        };

        if self.in_flight.is_some() {
            Some(IgnoredAttempt::InFlight)
        } else if self.progress[index].correct {
            Some(IgnoredAttempt::AlreadyCorrect)
        } else {
            None
        }
    }

    /// Mark an attempt as in flight for the current question
    pub fn begin_attempt(&mut self) -> Option<AttemptTicket> {
        if let Some(reason) = self.attempt_blocker() {
            debug!("Attempt ignored: {:?}", reason);
            return None;
        }

        let ticket = AttemptTicket {
            attempt_id: self.next_attempt_id,
            question_index: self.current_index(),
        };
        self.next_attempt_id += 1;
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Settle the outstanding attempt against the labels detected for it
    pub fn resolve_attempt<I, S>(&mut self, ticket: AttemptTicket, labels: I) -> Result<bool, QuizError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.in_flight != Some(ticket) {
            return Err(QuizError::StaleTicket {
                attempt_id: ticket.attempt_id,
            });
        }
        self.in_flight = None;

        let index = ticket.question_index;
        let correct = matches_expected(labels, self.items[index].expected_label());

        let progress = &mut self.progress[index];
        progress.attempts += 1;
        if correct {
            progress.correct = true;
            progress.revealed = true;
            self.score += 1;
        }

        info!(
            "Attempt {} on question {} ('{}'): {}",
            ticket.attempt_id,
            index + 1,
            self.items[index].expected_label(),
            if correct { "correct" } else { "incorrect" }
        );
        Ok(correct)
    }

    /// Begin and resolve an attempt in one call
    pub fn attempt<I, S>(&mut self, labels: I) -> AttemptOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(reason) = self.attempt_blocker() {
            return AttemptOutcome::Ignored(reason);
        }

        match self.begin_attempt() {
            Some(ticket) => AttemptOutcome::Resolved {
                correct: self.resolve_attempt(ticket, labels).unwrap_or(false),
            },
            None => AttemptOutcome::Ignored(IgnoredAttempt::NotActive),
        }
    }

    /// Move to the next question, or complete the quiz after the last one
    pub fn advance(&mut self) -> Result<QuizPhase, QuizError> {
        let QuizPhase::Active { index } = self.phase else {
            return Err(self.invalid("advance"));
        };
        if self.in_flight.is_some() {
            return Err(self.invalid("advance"));
        }

        if index + 1 >= self.items.len() {
            self.phase = QuizPhase::Completed;
            let summary = QuizSummary::new(self.score, self.outcomes());
            info!("Quiz completed: {}/{}", summary.score, summary.total);
            self.summary = Some(summary);
        } else {
            self.phase = QuizPhase::Active { index: index + 1 };
        }

        Ok(self.phase)
    }

    /// Show the expected answer for the current question
    pub fn reveal_answer(&mut self) -> Result<&QuizItem, QuizError> {
        let QuizPhase::Active { index } = self.phase else {
            return Err(self.invalid("reveal the answer"));
        };

        self.progress[index].revealed = true;
        Ok(&self.items[index])
    }

    /// Give up on the session; returns false if it had already ended
    pub fn abandon(&mut self) -> bool {
        if self.phase.is_terminal() {
            return false;
        }

        debug!("Quiz abandoned in phase {}", self.phase.name());
        self.phase = QuizPhase::Abandoned;
        self.in_flight = None;
        true
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    /// Index of the current question; equals `len()` once completed
    pub fn current_index(&self) -> usize {
        match self.phase {
            QuizPhase::Active { index } => index,
            QuizPhase::Completed => self.items.len(),
            _ => 0,
        }
    }

    pub fn current_item(&self) -> Option<&QuizItem> {
        match self.phase {
            QuizPhase::Active { index } => self.items.get(index),
            _ => None,
        }
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[QuizItem] {
        &self.items
    }

    pub fn is_attempt_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn answer_shown(&self) -> bool {
        match self.phase {
            QuizPhase::Active { index } => self.progress[index].revealed,
            _ => false,
        }
    }

    pub fn current_answered_correctly(&self) -> bool {
        match self.phase {
            QuizPhase::Active { index } => self.progress[index].correct,
            _ => false,
        }
    }

    pub fn attempts_on_current(&self) -> u32 {
        match self.phase {
            QuizPhase::Active { index } => self.progress[index].attempts,
            _ => 0,
        }
    }

    pub fn summary(&self) -> Option<&QuizSummary> {
        self.summary.as_ref()
    }

    fn outcomes(&self) -> Vec<QuestionOutcome> {
        self.items
            .iter()
            .zip(&self.progress)
            .map(|(item, progress)| QuestionOutcome {
                prompt: item.prompt().to_string(),
                expected_label: item.expected_label().to_string(),
                correct: progress.correct,
                revealed: progress.revealed,
                attempts: progress.attempts,
            })
            .collect()
    }
}

impl Default for QuizMatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}
