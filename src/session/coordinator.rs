use super::generation::Generation;
use super::handle::{QuizSnapshot, SessionCommand, SessionHandle, SessionSnapshot};
use crate::classifier::Classifier;
use crate::config::{LingoLensConfig, PolicyKind};
use crate::curation::{curate_or_empty, ObjectCuration, QuizBuilder, TargetLanguage};
use crate::error::{LingoLensError, Result, SessionError};
use crate::events::{EventBus, LingoLensEvent};
use crate::frame_buffer::FrameBuffer;
use crate::quiz::{AttemptTicket, QuizItem, QuizMatchingEngine, QuizPhase};
use crate::rate_limiter::RateLimiter;
use crate::stabilizer::{
    DetectionStabilizer, ScanBatch, ScanWorker, ScanWorkerBuilder, StabilizationPolicy, StableLabel,
};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Tunables the coordinator needs from configuration
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Policy applied to the continuous scan feed
    pub scan_policy: StabilizationPolicy,
    /// Policy applied to the single classification behind a quiz attempt
    pub attempt_policy: StabilizationPolicy,
    pub scan_interval: Duration,
    /// Upper bound on one attempt's classification; `None` waits forever
    pub attempt_timeout: Option<Duration>,
    pub language: TargetLanguage,
    pub command_queue_capacity: usize,
}

impl SessionSettings {
    pub fn from_config(config: &LingoLensConfig) -> Result<Self> {
        let stabilizer = &config.stabilizer;
        Ok(Self {
            scan_policy: StabilizationPolicy::from_config(stabilizer, stabilizer.policy),
            attempt_policy: StabilizationPolicy::from_config(stabilizer, PolicyKind::Candidate),
            scan_interval: stabilizer.scan_interval(),
            attempt_timeout: config.quiz.attempt_timeout(),
            language: config.quiz.language()?,
            command_queue_capacity: config.system.command_queue_capacity,
        })
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            scan_policy: StabilizationPolicy::locked(),
            attempt_policy: StabilizationPolicy::candidate(),
            scan_interval: Duration::from_millis(200),
            attempt_timeout: Some(Duration::from_secs(5)),
            language: TargetLanguage::French,
            command_queue_capacity: 32,
        }
    }
}

struct ScanSession {
    generation: u64,
    stabilizer: DetectionStabilizer,
    worker: ScanWorker,
}

struct QuizSession {
    generation: u64,
    engine: QuizMatchingEngine,
}

/// Results handed back by spawned workers
enum WorkerResult {
    QuizPrepared {
        generation: u64,
        items: Vec<QuizItem>,
    },
    AttemptFinished {
        generation: u64,
        ticket: AttemptTicket,
        labels: Vec<String>,
    },
}

/// Owner of all session state; runs as one tokio task
pub struct SessionCoordinator {
    settings: SessionSettings,
    frame_buffer: Arc<FrameBuffer>,
    classifier: Arc<dyn Classifier>,
    curation: Arc<dyn ObjectCuration>,
    quiz_builder: Arc<QuizBuilder>,
    event_bus: Arc<EventBus>,
    generation: Generation,
    scan: Option<ScanSession>,
    last_scan: Vec<StableLabel>,
    quiz: Option<QuizSession>,
    commands: mpsc::Receiver<SessionCommand>,
    scan_tx: mpsc::Sender<ScanBatch>,
    scan_rx: mpsc::Receiver<ScanBatch>,
    worker_tx: mpsc::Sender<WorkerResult>,
    worker_rx: mpsc::Receiver<WorkerResult>,
}

impl SessionCoordinator {
    /// Run on a new task; the task ends when every handle is dropped or on shutdown
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Sender feeding the scan result queue, as a worker would
    #[cfg(test)]
    pub(super) fn scan_feed(&self) -> mpsc::Sender<ScanBatch> {
        self.scan_tx.clone()
    }

    pub async fn run(mut self) {
        info!("Session coordinator started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                Some(batch) = self.scan_rx.recv() => self.apply_scan_batch(batch).await,
                Some(result) = self.worker_rx.recv() => self.apply_worker_result(result).await,
            }
        }

        if let Some(mut scan) = self.scan.take() {
            scan.worker.stop().await;
        }
        if let Some(quiz) = self.quiz.as_mut() {
            quiz.engine.abandon();
        }

        info!("Session coordinator stopped");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::StartScan { respond } => {
                let _ = respond.send(self.start_scan().await);
            }
            SessionCommand::StopScan { respond } => {
                let _ = respond.send(self.stop_scan().await);
            }
            SessionCommand::StartQuiz { labels, respond } => {
                let _ = respond.send(self.start_quiz(labels));
            }
            SessionCommand::Attempt => self.begin_attempt().await,
            SessionCommand::RevealAnswer { respond } => {
                let _ = respond.send(self.reveal_answer().await);
            }
            SessionCommand::Advance { respond } => {
                let _ = respond.send(self.advance().await);
            }
            SessionCommand::AbandonQuiz { respond } => {
                let abandoned = self
                    .quiz
                    .as_mut()
                    .map(|quiz| quiz.engine.abandon())
                    .unwrap_or(false);
                let _ = respond.send(abandoned);
            }
            SessionCommand::Snapshot { respond } => {
                let _ = respond.send(self.snapshot());
            }
            SessionCommand::Shutdown => {}
        }
    }

    async fn emit(&self, event: LingoLensEvent) {
        if let Err(e) = self.event_bus.publish(event).await {
            trace!("Event not delivered: {}", e);
        }
    }

    async fn start_scan(&mut self) -> Result<u64> {
        if self.scan.is_some() {
            self.stop_scan().await;
        }

        let generation = self.generation.advance();
        let mut worker = ScanWorkerBuilder::new()
            .frame_buffer(Arc::clone(&self.frame_buffer))
            .classifier(Arc::clone(&self.classifier))
            .scan_interval(self.settings.scan_interval)
            .results(self.scan_tx.clone())
            .build()?;
        worker.start(generation);

        // The worker already paces classification
        let stabilizer = DetectionStabilizer::new(self.settings.scan_policy, RateLimiter::on_demand());

        self.scan = Some(ScanSession {
            generation,
            stabilizer,
            worker,
        });
        self.emit(LingoLensEvent::ScanStarted { generation }).await;
        Ok(generation)
    }

    async fn stop_scan(&mut self) -> Vec<StableLabel> {
        let Some(mut scan) = self.scan.take() else {
            debug!("No scan running");
            return self.last_scan.clone();
        };

        scan.worker.stop().await;
        self.last_scan = scan.stabilizer.stable_labels().to_vec();

        info!(
            "Scan {} stopped with {} stable labels",
            scan.generation,
            self.last_scan.len()
        );
        self.emit(LingoLensEvent::ScanStopped {
            generation: scan.generation,
            label_count: self.last_scan.len(),
        })
        .await;

        self.last_scan.clone()
    }

    async fn apply_scan_batch(&mut self, batch: ScanBatch) {
        let Some(scan) = self.scan.as_mut().filter(|scan| scan.generation == batch.generation) else {
            debug!(
                "Dropping stale scan result for generation {} (frame {})",
                batch.generation, batch.frame_id
            );
            return;
        };

        let generation = scan.generation;
        let accepted = scan.stabilizer.accept(&batch.observations);

        for stable in accepted {
            self.emit(LingoLensEvent::StableObservation {
                generation,
                label: stable.label,
                order: stable.first_seen_order,
                timestamp: SystemTime::now(),
            })
            .await;
        }
    }

    fn start_quiz(&mut self, labels: Vec<String>) -> u64 {
        if let Some(previous) = self.quiz.as_mut() {
            previous.engine.abandon();
        }

        let generation = self.generation.advance();
        self.quiz = Some(QuizSession {
            generation,
            engine: QuizMatchingEngine::new(),
        });

        info!("Preparing quiz {} from {} selected labels", generation, labels.len());

        let curation = Arc::clone(&self.curation);
        let quiz_builder = Arc::clone(&self.quiz_builder);
        let language = self.settings.language;
        let results = self.worker_tx.clone();

        tokio::spawn(async move {
            let curated = curate_or_empty(curation.as_ref(), &labels).await;
            let items = if curated.is_empty() {
                Vec::new()
            } else {
                quiz_builder.build(&curated, language).await
            };

            if results
                .send(WorkerResult::QuizPrepared { generation, items })
                .await
                .is_err()
            {
                debug!("Coordinator gone before quiz {} was prepared", generation);
            }
        });

        generation
    }

    async fn apply_worker_result(&mut self, result: WorkerResult) {
        match result {
            WorkerResult::QuizPrepared { generation, items } => {
                self.apply_quiz_items(generation, items).await
            }
            WorkerResult::AttemptFinished {
                generation,
                ticket,
                labels,
            } => self.apply_attempt(generation, ticket, labels).await,
        }
    }

    fn current_quiz(&mut self, generation: u64) -> Option<&mut QuizSession> {
        self.quiz
            .as_mut()
            .filter(|quiz| quiz.generation == generation)
    }

    async fn apply_quiz_items(&mut self, generation: u64, items: Vec<QuizItem>) {
        let language = self.settings.language;
        let Some(quiz) = self.current_quiz(generation) else {
            debug!("Dropping items for stale quiz {}", generation);
            return;
        };

        let phase = match quiz.engine.start(items) {
            Ok(phase) => phase,
            Err(e) => {
                // Abandoned while loading
                debug!("Quiz {} not started: {}", generation, e);
                return;
            }
        };

        match phase {
            QuizPhase::Empty => {
                self.emit(LingoLensEvent::SessionEmpty { generation }).await;
            }
            _ => {
                let total = quiz.engine.len();
                let prompt = quiz
                    .engine
                    .current_item()
                    .map(|item| item.prompt().to_string())
                    .unwrap_or_default();

                self.emit(LingoLensEvent::QuizStarted {
                    generation,
                    total,
                    language,
                })
                .await;
                self.emit(LingoLensEvent::QuestionAdvanced {
                    generation,
                    question_index: 0,
                    prompt,
                })
                .await;
            }
        }
    }

    async fn begin_attempt(&mut self) {
        let Some(quiz) = self.quiz.as_mut() else {
            debug!("Attempt without a quiz");
            return;
        };
        if let Some(reason) = quiz.engine.attempt_blocker() {
            debug!("Attempt ignored: {:?}", reason);
            return;
        }
        let Some(frame) = self.frame_buffer.latest() else {
            debug!("No frame available for attempt");
            return;
        };
        let Some(ticket) = quiz.engine.begin_attempt() else {
            return;
        };

        let generation = quiz.generation;
        let classifier = Arc::clone(&self.classifier);
        let policy = self.settings.attempt_policy;
        let attempt_timeout = self.settings.attempt_timeout;
        let results = self.worker_tx.clone();

        tokio::spawn(async move {
            let mut stabilizer = DetectionStabilizer::new(policy, RateLimiter::on_demand());
            let detection = stabilizer.submit(&frame, classifier.as_ref(), Instant::now());

            let accepted = match attempt_timeout {
                Some(limit) => match tokio::time::timeout(limit, detection).await {
                    Ok(accepted) => accepted,
                    Err(_) => {
                        warn!(
                            "Classifier {} did not answer attempt {} within {:?}",
                            classifier.name(),
                            ticket.attempt_id,
                            limit
                        );
                        Vec::new()
                    }
                },
                None => detection.await,
            };

            let labels = accepted.into_iter().map(|stable| stable.label).collect();
            if results
                .send(WorkerResult::AttemptFinished {
                    generation,
                    ticket,
                    labels,
                })
                .await
                .is_err()
            {
                debug!("Coordinator gone before attempt {} finished", ticket.attempt_id);
            }
        });

        self.emit(LingoLensEvent::AttemptStarted {
            generation,
            question_index: ticket.question_index,
        })
        .await;
    }

    async fn apply_attempt(&mut self, generation: u64, ticket: AttemptTicket, labels: Vec<String>) {
        let Some(quiz) = self.current_quiz(generation) else {
            debug!(
                "Dropping attempt {} result for stale quiz {}",
                ticket.attempt_id, generation
            );
            return;
        };

        match quiz.engine.resolve_attempt(ticket, &labels) {
            Ok(correct) => {
                let score = quiz.engine.score();
                self.emit(LingoLensEvent::AttemptResolved {
                    generation,
                    question_index: ticket.question_index,
                    correct,
                    score,
                })
                .await;
            }
            Err(e) => debug!("Dropping attempt result: {}", e),
        }
    }

    fn active_quiz(&mut self) -> Result<&mut QuizSession> {
        self.quiz
            .as_mut()
            .ok_or_else(|| LingoLensError::from(SessionError::NoQuiz))
    }

    async fn reveal_answer(&mut self) -> Result<String> {
        let quiz = self.active_quiz()?;
        let generation = quiz.generation;
        let question_index = quiz.engine.current_index();
        let expected_label = quiz.engine.reveal_answer()?.expected_label().to_string();

        self.emit(LingoLensEvent::AnswerRevealed {
            generation,
            question_index,
            expected_label: expected_label.clone(),
        })
        .await;
        Ok(expected_label)
    }

    async fn advance(&mut self) -> Result<QuizPhase> {
        let quiz = self.active_quiz()?;
        let generation = quiz.generation;
        let phase = quiz.engine.advance()?;

        let event = match phase {
            QuizPhase::Active { index } => LingoLensEvent::QuestionAdvanced {
                generation,
                question_index: index,
                prompt: quiz
                    .engine
                    .current_item()
                    .map(|item| item.prompt().to_string())
                    .unwrap_or_default(),
            },
            _ => LingoLensEvent::SessionCompleted {
                generation,
                score: quiz.engine.score(),
                total: quiz.engine.len(),
            },
        };

        self.emit(event).await;
        Ok(phase)
    }

    fn snapshot(&self) -> SessionSnapshot {
        let stable_labels = match &self.scan {
            Some(scan) => scan.stabilizer.stable_labels().to_vec(),
            None => self.last_scan.clone(),
        };

        let quiz = self.quiz.as_ref().map(|quiz| {
            let engine = &quiz.engine;
            let current = engine.current_item();
            QuizSnapshot {
                generation: quiz.generation,
                phase: engine.phase(),
                current_index: engine.current_index(),
                total: engine.len(),
                score: engine.score(),
                attempt_in_flight: engine.is_attempt_in_flight(),
                answer_shown: engine.answer_shown(),
                answered_correctly: engine.current_answered_correctly(),
                prompt: current.map(|item| item.prompt().to_string()),
                revealed_answer: current
                    .filter(|_| engine.answer_shown())
                    .map(|item| item.expected_label().to_string()),
                summary: engine.summary().cloned(),
            }
        });

        SessionSnapshot {
            scanning: self.scan.is_some(),
            scan_generation: self.scan.as_ref().map(|scan| scan.generation),
            stable_labels,
            quiz,
        }
    }
}

/// Builder for SessionCoordinator
pub struct SessionCoordinatorBuilder {
    settings: SessionSettings,
    frame_buffer: Option<Arc<FrameBuffer>>,
    classifier: Option<Arc<dyn Classifier>>,
    curation: Option<Arc<dyn ObjectCuration>>,
    quiz_builder: Option<Arc<QuizBuilder>>,
    event_bus: Option<Arc<EventBus>>,
}

impl SessionCoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            settings: SessionSettings::default(),
            frame_buffer: None,
            classifier: None,
            curation: None,
            quiz_builder: None,
            event_bus: None,
        }
    }

    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn frame_buffer(mut self, frame_buffer: Arc<FrameBuffer>) -> Self {
        self.frame_buffer = Some(frame_buffer);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn curation(mut self, curation: Arc<dyn ObjectCuration>) -> Self {
        self.curation = Some(curation);
        self
    }

    pub fn quiz_builder(mut self, quiz_builder: Arc<QuizBuilder>) -> Self {
        self.quiz_builder = Some(quiz_builder);
        self
    }

    pub fn event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn build(self) -> Result<(SessionCoordinator, SessionHandle)> {
        let missing = |what: &str| {
            LingoLensError::component("session_coordinator_builder".to_string(), format!("{} is required", what))
        };

        let frame_buffer = self.frame_buffer.ok_or_else(|| missing("Frame buffer"))?;
        let classifier = self.classifier.ok_or_else(|| missing("Classifier"))?;
        let curation = self.curation.ok_or_else(|| missing("Curation"))?;
        let quiz_builder = self.quiz_builder.ok_or_else(|| missing("Quiz builder"))?;
        let event_bus = self.event_bus.ok_or_else(|| missing("Event bus"))?;

        if self.settings.command_queue_capacity == 0 {
            return Err(LingoLensError::component(
                "session_coordinator_builder",
                "Command queue capacity must be greater than 0",
            ));
        }

        let (command_tx, commands) = mpsc::channel(self.settings.command_queue_capacity);
        let (scan_tx, scan_rx) = mpsc::channel(self.settings.command_queue_capacity);
        let (worker_tx, worker_rx) = mpsc::channel(self.settings.command_queue_capacity);

        let coordinator = SessionCoordinator {
            settings: self.settings,
            frame_buffer,
            classifier,
            curation,
            quiz_builder,
            event_bus,
            generation: Generation::new(),
            scan: None,
            last_scan: Vec::new(),
            quiz: None,
            commands,
            scan_tx,
            scan_rx,
            worker_tx,
            worker_rx,
        };

        Ok((coordinator, SessionHandle::new(command_tx)))
    }
}

impl Default for SessionCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
