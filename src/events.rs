use crate::curation::TargetLanguage;
use crate::error::EventBusError;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

/// Events that can occur in the lingolens system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LingoLensEvent {
    /// A scanning session started
    ScanStarted { generation: u64 },
    /// A label passed the stabilization policy for the first time this session
    StableObservation {
        generation: u64,
        label: String,
        order: usize,
        timestamp: SystemTime,
    },
    /// A scanning session ended
    ScanStopped { generation: u64, label_count: usize },
    /// Quiz items are ready and the first question is active
    QuizStarted {
        generation: u64,
        total: usize,
        language: TargetLanguage,
    },
    /// Curation or translation left nothing to quiz
    SessionEmpty { generation: u64 },
    /// A detection attempt is running for the current question
    AttemptStarted {
        generation: u64,
        question_index: usize,
    },
    /// A detection attempt was adjudicated
    AttemptResolved {
        generation: u64,
        question_index: usize,
        correct: bool,
        score: usize,
    },
    /// The expected answer for a question was shown
    AnswerRevealed {
        generation: u64,
        question_index: usize,
        expected_label: String,
    },
    /// The quiz moved on to another question
    QuestionAdvanced {
        generation: u64,
        question_index: usize,
        prompt: String,
    },
    /// The last question was passed; the score is final
    SessionCompleted {
        generation: u64,
        score: usize,
        total: usize,
    },
    /// User asked to check the camera view against the current question
    TapDetected { timestamp: SystemTime },
    /// User asked to see the answer
    RevealRequested { timestamp: SystemTime },
    /// User asked for the next question
    NextRequested { timestamp: SystemTime },
    /// User asked to finish scanning
    StopScanRequested { timestamp: SystemTime },
    /// A system error occurred in a component
    SystemError { component: String, error: String },
    /// System shutdown requested
    ShutdownRequested {
        timestamp: SystemTime,
        reason: String,
    },
}

impl LingoLensEvent {
    /// Session generation the event belongs to, if any
    pub fn generation(&self) -> Option<u64> {
        match self {
            LingoLensEvent::ScanStarted { generation }
            | LingoLensEvent::StableObservation { generation, .. }
            | LingoLensEvent::ScanStopped { generation, .. }
            | LingoLensEvent::QuizStarted { generation, .. }
            | LingoLensEvent::SessionEmpty { generation }
            | LingoLensEvent::AttemptStarted { generation, .. }
            | LingoLensEvent::AttemptResolved { generation, .. }
            | LingoLensEvent::AnswerRevealed { generation, .. }
            | LingoLensEvent::QuestionAdvanced { generation, .. }
            | LingoLensEvent::SessionCompleted { generation, .. } => Some(*generation),
            _ => None,
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            LingoLensEvent::ScanStarted { generation } => {
                format!("Scan {} started", generation)
            }
            LingoLensEvent::StableObservation { label, order, .. } => {
                format!("Stable observation #{}: {}", order + 1, label)
            }
            LingoLensEvent::ScanStopped {
                generation,
                label_count,
            } => format!("Scan {} stopped with {} labels", generation, label_count),
            LingoLensEvent::QuizStarted {
                total, language, ..
            } => format!("Quiz started: {} questions in {}", total, language),
            LingoLensEvent::SessionEmpty { .. } => "Nothing to quiz".to_string(),
            LingoLensEvent::AttemptStarted { question_index, .. } => {
                format!("Checking question {}", question_index + 1)
            }
            LingoLensEvent::AttemptResolved {
                question_index,
                correct,
                score,
                ..
            } => format!(
                "Question {} {} (score {})",
                question_index + 1,
                if *correct { "correct" } else { "incorrect" },
                score
            ),
            LingoLensEvent::AnswerRevealed {
                question_index,
                expected_label,
                ..
            } => format!("Answer for question {}: {}", question_index + 1, expected_label),
            LingoLensEvent::QuestionAdvanced {
                question_index,
                prompt,
                ..
            } => format!("Question {}: {}", question_index + 1, prompt),
            LingoLensEvent::SessionCompleted { score, total, .. } => {
                format!("Quiz completed: {}/{}", score, total)
            }
            LingoLensEvent::TapDetected { .. } => "Tap detected".to_string(),
            LingoLensEvent::RevealRequested { .. } => "Reveal requested".to_string(),
            LingoLensEvent::NextRequested { .. } => "Next question requested".to_string(),
            LingoLensEvent::StopScanRequested { .. } => "Stop scan requested".to_string(),
            LingoLensEvent::SystemError { component, error } => {
                format!("Error in {}: {}", component, error)
            }
            LingoLensEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            LingoLensEvent::ScanStarted { .. } => "scan_started",
            LingoLensEvent::StableObservation { .. } => "stable_observation",
            LingoLensEvent::ScanStopped { .. } => "scan_stopped",
            LingoLensEvent::QuizStarted { .. } => "quiz_started",
            LingoLensEvent::SessionEmpty { .. } => "session_empty",
            LingoLensEvent::AttemptStarted { .. } => "attempt_started",
            LingoLensEvent::AttemptResolved { .. } => "attempt_resolved",
            LingoLensEvent::AnswerRevealed { .. } => "answer_revealed",
            LingoLensEvent::QuestionAdvanced { .. } => "question_advanced",
            LingoLensEvent::SessionCompleted { .. } => "session_completed",
            LingoLensEvent::TapDetected { .. } => "tap_detected",
            LingoLensEvent::RevealRequested { .. } => "reveal_requested",
            LingoLensEvent::NextRequested { .. } => "next_requested",
            LingoLensEvent::StopScanRequested { .. } => "stop_scan_requested",
            LingoLensEvent::SystemError { .. } => "system_error",
            LingoLensEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Async event bus for component coordination using broadcast channels
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LingoLensEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LingoLensEvent> {
        self.sender.subscribe()
    }

    /// Subscribe through a filter
    pub fn receiver(&self, filter: EventFilter, name: &str) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), filter, name.to_string())
    }

    /// Publish an event to all subscribers
    pub async fn publish(&self, event: LingoLensEvent) -> Result<usize, EventBusError> {
        match &event {
            LingoLensEvent::SystemError { component, error } => {
                error!("System error in {}: {}", component, error);
            }
            LingoLensEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            LingoLensEvent::SessionEmpty { generation } => {
                info!("Quiz session {} has nothing to quiz", generation);
            }
            _ => trace!("Event: {}", event.description()),
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    All,
    EventTypes(Vec<&'static str>),
    /// Events tagged with one session generation
    Generation(u64),
    Custom(fn(&LingoLensEvent) -> bool),
}

impl EventFilter {
    pub fn matches(&self, event: &LingoLensEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
            EventFilter::Generation(generation) => event.generation() == Some(*generation),
            EventFilter::Custom(filter_fn) => filter_fn(event),
        }
    }
}

/// Event receiver with filtering
pub struct EventReceiver {
    receiver: broadcast::Receiver<LingoLensEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    pub fn new(
        receiver: broadcast::Receiver<LingoLensEvent>,
        filter: EventFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next event passing the filter.
    ///
    /// Lagging is logged and skipped; only a closed bus is an error.
    pub async fn recv(&mut self) -> Result<LingoLensEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<Option<LingoLensEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}
