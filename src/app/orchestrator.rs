use super::keyboard_input::KeyboardInputHandler;
use super::types::{ComponentState, FlowOutcome, RunMode, ShutdownReason};
use crate::camera::{CaptureGuard, FrameSource, SyntheticCameraBuilder};
use crate::classifier::{build_classifier, Classifier};
use crate::config::LingoLensConfig;
use crate::curation::{BlocklistCuration, DictionaryTranslator, QuizBuilder, Translator};
use crate::error::Result;
use crate::events::EventBus;
use crate::frame_buffer::FrameBuffer;
use crate::session::{SessionCoordinator, SessionCoordinatorBuilder, SessionHandle, SessionSettings};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Main application coordinator that owns and sequences every component
pub struct LingoLensOrchestrator {
    pub(super) config: LingoLensConfig,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) frame_buffer: Arc<FrameBuffer>,

    // Components
    pub(super) camera: Arc<dyn FrameSource>,
    pub(super) capture: Option<CaptureGuard>,
    pub(super) coordinator: Option<SessionCoordinator>,
    pub(super) coordinator_task: Option<JoinHandle<()>>,
    pub(super) session: SessionHandle,
    pub(super) keyboard_handler: Option<KeyboardInputHandler>,
    pub(super) keyboard_enabled: bool,

    // Flow options
    pub(super) mode: RunMode,
    pub(super) auto_attempt: Option<Duration>,
    pub(super) quiz_labels: Vec<String>,
    pub(super) outcome: Option<FlowOutcome>,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) shutdown_sender: Option<oneshot::Sender<ShutdownReason>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
}

impl LingoLensOrchestrator {
    /// Create an orchestrator with collaborators built from configuration
    pub async fn new(config: LingoLensConfig) -> Result<Self> {
        config.validate()?;

        let classifier = build_classifier(&config.classifier)?;
        let translator: Arc<dyn Translator> = match &config.quiz.dictionary_path {
            Some(path) => Arc::new(DictionaryTranslator::from_file(path)?),
            None => Arc::new(DictionaryTranslator::builtin()),
        };

        Self::with_collaborators(config, classifier, translator)
    }

    /// Create an orchestrator around the given classifier and translator
    pub fn with_collaborators(
        config: LingoLensConfig,
        classifier: Arc<dyn Classifier>,
        translator: Arc<dyn Translator>,
    ) -> Result<Self> {
        let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
        let frame_buffer = Arc::new(FrameBuffer::new());
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        let camera = Arc::new(
            SyntheticCameraBuilder::new()
                .config(config.camera.clone())
                .build()?,
        );

        let quiz_builder = Arc::new(QuizBuilder::new(
            translator,
            &config.quiz.blocked_labels,
            config.quiz.shuffle,
        ));

        let (coordinator, session) = SessionCoordinatorBuilder::new()
            .settings(SessionSettings::from_config(&config)?)
            .frame_buffer(Arc::clone(&frame_buffer))
            .classifier(classifier)
            .curation(Arc::new(BlocklistCuration::default()))
            .quiz_builder(quiz_builder)
            .event_bus(Arc::clone(&event_bus))
            .build()?;

        let keyboard_handler = Some(KeyboardInputHandler::new(Arc::clone(&event_bus)));

        info!(
            "Orchestrator created (target language {}, {:?} scan policy)",
            config.quiz.target_language, config.stabilizer.policy
        );

        Ok(Self {
            config,
            event_bus,
            frame_buffer,
            camera,
            capture: None,
            coordinator: Some(coordinator),
            coordinator_task: None,
            session,
            keyboard_handler,
            keyboard_enabled: false,
            mode: RunMode::Full,
            auto_attempt: None,
            quiz_labels: Vec::new(),
            outcome: None,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Some(shutdown_sender),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
        })
    }

    /// Enable or disable the keyboard input handler
    pub fn set_keyboard_enabled(&mut self, enabled: bool) {
        self.keyboard_enabled = enabled;
    }

    pub fn set_mode(&mut self, mode: RunMode) {
        self.mode = mode;
    }

    /// Issue quiz attempts on a timer instead of waiting for input
    pub fn set_auto_attempt(&mut self, period: Option<Duration>) {
        self.auto_attempt = period;
    }

    /// Labels used by [`RunMode::Quiz`]
    pub fn set_quiz_labels(&mut self, labels: Vec<String>) {
        self.quiz_labels = labels;
    }

    pub fn session(&self) -> SessionHandle {
        self.session.clone()
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn frame_buffer(&self) -> Arc<FrameBuffer> {
        Arc::clone(&self.frame_buffer)
    }

    /// How the last run ended, once [`Self::run`] has returned
    pub fn outcome(&self) -> Option<&FlowOutcome> {
        self.outcome.as_ref()
    }

    pub fn config(&self) -> &LingoLensConfig {
        &self.config
    }

    /// Record a lifecycle transition for `component`
    pub async fn set_component_state(&self, component: &str, state: ComponentState) {
        let previous = self
            .component_states
            .lock()
            .await
            .insert(component.to_string(), state.clone());

        match previous {
            Some(previous) if previous != state => {
                debug!("Component '{}': {:?} -> {:?}", component, previous, state)
            }
            Some(_) => {}
            None => debug!("Component '{}' registered as {:?}", component, state),
        }
    }

    pub async fn get_component_state(&self, component: &str) -> Option<ComponentState> {
        self.component_states.lock().await.get(component).cloned()
    }

    /// Every registered component with its current state
    pub async fn get_all_component_states(&self) -> HashMap<String, ComponentState> {
        self.component_states.lock().await.clone()
    }
}
