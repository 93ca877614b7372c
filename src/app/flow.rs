use super::types::{FlowOutcome, RunMode, ShutdownReason};
use crate::error::{LingoLensError, Result};
use crate::events::{EventBus, EventFilter, LingoLensEvent};
use crate::quiz::QuizSummary;
use crate::session::SessionHandle;
use crate::stabilizer::StableLabel;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, sleep, Interval, MissedTickBehavior};
use tracing::{debug, info};

/// Incorrect attempts after which auto mode shows the answer and moves on
const AUTO_REVEAL_AFTER_ATTEMPTS: u32 = 3;

/// Print a line that stays readable while the terminal is in raw mode
fn say(line: &str) {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "{}\r\n", line);
    let _ = stdout.flush();
}

/// Drives one run of the application: scan, quiz, or both in sequence.
///
/// User intent arrives as events on the bus (keyboard or any other
/// publisher) and is turned into [`SessionHandle`] calls.
pub(super) struct SessionFlow {
    session: SessionHandle,
    event_bus: Arc<EventBus>,
    mode: RunMode,
    /// Zero scans until stopped by hand
    scan_duration: Duration,
    auto_attempt: Option<Duration>,
    quiz_labels: Vec<String>,
}

impl SessionFlow {
    pub(super) fn new(
        session: SessionHandle,
        event_bus: Arc<EventBus>,
        mode: RunMode,
        scan_duration: Duration,
        auto_attempt: Option<Duration>,
        quiz_labels: Vec<String>,
    ) -> Self {
        Self {
            session,
            event_bus,
            mode,
            scan_duration,
            auto_attempt,
            quiz_labels,
        }
    }

    pub(super) async fn run(self) -> Result<FlowOutcome> {
        match self.mode {
            RunMode::Scan => Ok(match self.scan().await? {
                Some(labels) => FlowOutcome::Scanned(labels),
                None => FlowOutcome::Interrupted(ShutdownReason::UserRequest),
            }),
            RunMode::Quiz => self.quiz(self.quiz_labels.clone()).await,
            RunMode::Full => match self.scan().await? {
                Some(labels) => {
                    let labels = labels.into_iter().map(|stable| stable.label).collect();
                    self.quiz(labels).await
                }
                None => Ok(FlowOutcome::Interrupted(ShutdownReason::UserRequest)),
            },
        }
    }

    /// Scan until the deadline or a stop request; `None` when the user quit
    async fn scan(&self) -> Result<Option<Vec<StableLabel>>> {
        let mut events = self.event_bus.receiver(EventFilter::All, "session_flow_scan");
        let generation = self.session.start_scan().await?;

        if self.scan_duration.is_zero() {
            say("Scanning... point the camera around, press 's' when done");
        } else {
            say(&format!(
                "Scanning for {}s... point the camera around, press 's' to stop early",
                self.scan_duration.as_secs()
            ));
        }

        let deadline = async {
            if self.scan_duration.is_zero() {
                std::future::pending::<()>().await
            } else {
                sleep(self.scan_duration).await
            }
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    debug!("Scan {} reached its deadline", generation);
                    break;
                }
                event = events.recv() => match event? {
                    LingoLensEvent::StableObservation { generation: g, label, order, .. } if g == generation => {
                        say(&format!("  {}. {}", order + 1, label));
                    }
                    LingoLensEvent::StopScanRequested { .. } => break,
                    LingoLensEvent::ShutdownRequested { reason, .. } => {
                        info!("Scan interrupted: {}", reason);
                        self.session.stop_scan().await?;
                        return Ok(None);
                    }
                    _ => {}
                },
            }
        }

        let labels = self.session.stop_scan().await?;
        say(&format!("Scan finished with {} objects", labels.len()));
        Ok(Some(labels))
    }

    async fn quiz(&self, labels: Vec<String>) -> Result<FlowOutcome> {
        let mut events = self.event_bus.receiver(EventFilter::All, "session_flow_quiz");
        let generation = self.session.start_quiz(labels).await?;
        say("Preparing quiz...");

        let mut ticker: Option<Interval> = self.auto_attempt.map(|period| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        let auto = ticker.is_some();
        let mut incorrect_on_question = 0u32;

        loop {
            let auto_tick = async {
                match ticker.as_mut() {
                    Some(ticker) => {
                        ticker.tick().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            };

            let event = tokio::select! {
                _ = auto_tick => {
                    self.session.attempt().await?;
                    continue;
                }
                event = events.recv() => event?,
            };

            if event.generation().is_some_and(|g| g != generation) {
                continue;
            }

            match event {
                LingoLensEvent::QuizStarted { total, language, .. } => {
                    say(&format!("{} quiz: {} questions", language, total));
                }
                LingoLensEvent::SessionEmpty { .. } => {
                    say("Nothing to quiz on, scan some everyday objects first");
                    return Ok(FlowOutcome::NothingToQuiz);
                }
                LingoLensEvent::QuestionAdvanced {
                    question_index,
                    prompt,
                    ..
                } => {
                    incorrect_on_question = 0;
                    say(&format!(
                        "Question {}: find the '{}' and tap (SPACE)",
                        question_index + 1,
                        prompt
                    ));
                }
                LingoLensEvent::AttemptResolved { correct: true, score, .. } => {
                    say(&format!("Correct! Score: {}", score));
                    if auto {
                        self.advance().await?;
                    }
                }
                LingoLensEvent::AttemptResolved { correct: false, .. } => {
                    incorrect_on_question += 1;
                    say("Not quite, try again ('a' shows the answer)");
                    if auto && incorrect_on_question >= AUTO_REVEAL_AFTER_ATTEMPTS {
                        self.reveal().await?;
                        self.advance().await?;
                    }
                }
                LingoLensEvent::AnswerRevealed { expected_label, .. } => {
                    say(&format!("The answer was: {}", expected_label));
                }
                LingoLensEvent::SessionCompleted { .. } => {
                    return self.completed_summary().await.map(FlowOutcome::QuizCompleted);
                }
                LingoLensEvent::TapDetected { .. } => self.session.attempt().await?,
                LingoLensEvent::RevealRequested { .. } => self.reveal().await?,
                LingoLensEvent::NextRequested { .. } => self.advance().await?,
                LingoLensEvent::ShutdownRequested { reason, .. } => {
                    info!("Quiz interrupted: {}", reason);
                    self.session.abandon_quiz().await?;
                    return Ok(FlowOutcome::Interrupted(ShutdownReason::UserRequest));
                }
                _ => {}
            }
        }
    }

    /// Request the answer; refusals by the quiz are reported, not fatal
    async fn reveal(&self) -> Result<()> {
        match self.session.reveal_answer().await {
            Ok(_) => Ok(()),
            Err(LingoLensError::Quiz(e)) => {
                debug!("Reveal refused: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn advance(&self) -> Result<()> {
        match self.session.advance().await {
            Ok(_) => Ok(()),
            Err(LingoLensError::Quiz(e)) => {
                debug!("Advance refused: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn completed_summary(&self) -> Result<QuizSummary> {
        self.session
            .snapshot()
            .await?
            .quiz
            .and_then(|quiz| quiz.summary)
            .ok_or_else(|| LingoLensError::system("Quiz completed without a summary"))
    }
}

/// Print how a run ended
pub(super) fn report(outcome: &FlowOutcome) {
    match outcome {
        FlowOutcome::Scanned(labels) => {
            say(&format!("Found {} objects:", labels.len()));
            for stable in labels {
                say(&format!("  {}", stable.label));
            }
        }
        FlowOutcome::QuizCompleted(summary) => {
            say(&format!(
                "Quiz complete: {}/{} ({}%)",
                summary.score,
                summary.total,
                summary.percent()
            ));
            say(summary.grade.message());
            for outcome in &summary.outcomes {
                let mark = if outcome.correct {
                    "correct"
                } else if outcome.revealed {
                    "revealed"
                } else {
                    "missed"
                };
                say(&format!(
                    "  {} = {} ({}, {} attempts)",
                    outcome.prompt, outcome.expected_label, mark, outcome.attempts
                ));
            }
        }
        FlowOutcome::NothingToQuiz => say("No quiz this time"),
        FlowOutcome::Interrupted(reason) => say(&format!("Stopped: {:?}", reason)),
    }
}
