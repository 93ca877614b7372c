use crate::error::{LingoLensError, Result, SessionError};
use crate::quiz::{QuizPhase, QuizSummary};
use crate::stabilizer::StableLabel;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

/// Requests understood by the coordinator
pub(crate) enum SessionCommand {
    StartScan {
        respond: oneshot::Sender<Result<u64>>,
    },
    StopScan {
        respond: oneshot::Sender<Vec<StableLabel>>,
    },
    StartQuiz {
        labels: Vec<String>,
        respond: oneshot::Sender<u64>,
    },
    Attempt,
    RevealAnswer {
        respond: oneshot::Sender<Result<String>>,
    },
    Advance {
        respond: oneshot::Sender<Result<QuizPhase>>,
    },
    AbandonQuiz {
        respond: oneshot::Sender<bool>,
    },
    Snapshot {
        respond: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown,
}

/// Point-in-time view of a quiz session
#[derive(Debug, Clone, Serialize)]
pub struct QuizSnapshot {
    pub generation: u64,
    pub phase: QuizPhase,
    pub current_index: usize,
    pub total: usize,
    pub score: usize,
    pub attempt_in_flight: bool,
    pub answer_shown: bool,
    pub answered_correctly: bool,
    pub prompt: Option<String>,
    /// Expected label, present only once the answer is shown
    pub revealed_answer: Option<String>,
    pub summary: Option<QuizSummary>,
}

/// Point-in-time view of everything the coordinator owns
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub scanning: bool,
    pub scan_generation: Option<u64>,
    /// Labels of the running scan, or of the last finished one
    pub stable_labels: Vec<StableLabel>,
    pub quiz: Option<QuizSnapshot>,
}

/// Cloneable front door to a running [`super::SessionCoordinator`]
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(commands: mpsc::Sender<SessionCommand>) -> Self {
        Self { commands }
    }

    async fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| LingoLensError::from(SessionError::CoordinatorClosed))
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand) -> Result<T> {
        let (respond, response) = oneshot::channel();
        self.send(command(respond)).await?;
        response
            .await
            .map_err(|_| LingoLensError::from(SessionError::CoordinatorClosed))
    }

    /// Start a new scanning session, replacing any running one; returns its generation
    pub async fn start_scan(&self) -> Result<u64> {
        self.request(|respond| SessionCommand::StartScan { respond })
            .await?
    }

    /// Stop scanning and return the labels it accepted
    pub async fn stop_scan(&self) -> Result<Vec<StableLabel>> {
        self.request(|respond| SessionCommand::StopScan { respond })
            .await
    }

    /// Start a quiz over the user-selected labels; returns its generation.
    ///
    /// Items are prepared in the background; watch for `QuizStarted` or
    /// `SessionEmpty` on the event bus.
    pub async fn start_quiz(&self, labels: Vec<String>) -> Result<u64> {
        self.request(|respond| SessionCommand::StartQuiz { labels, respond })
            .await
    }

    /// Check the current camera view against the current question.
    ///
    /// Ignored while another attempt is outstanding.
    pub async fn attempt(&self) -> Result<()> {
        self.send(SessionCommand::Attempt).await
    }

    /// Show the expected label for the current question
    pub async fn reveal_answer(&self) -> Result<String> {
        self.request(|respond| SessionCommand::RevealAnswer { respond })
            .await?
    }

    pub async fn advance(&self) -> Result<QuizPhase> {
        self.request(|respond| SessionCommand::Advance { respond })
            .await?
    }

    /// Abandon the quiz; false if there was none or it had already ended
    pub async fn abandon_quiz(&self) -> Result<bool> {
        self.request(|respond| SessionCommand::AbandonQuiz { respond })
            .await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(|respond| SessionCommand::Snapshot { respond })
            .await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(SessionCommand::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}
