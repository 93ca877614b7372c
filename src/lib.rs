pub mod app;
pub mod camera;
pub mod classifier;
pub mod config;
pub mod curation;
pub mod error;
pub mod events;
pub mod frame;
pub mod frame_buffer;
pub mod quiz;
pub mod rate_limiter;
pub mod session;
pub mod stabilizer;

pub use app::{ComponentState, FlowOutcome, LingoLensOrchestrator, RunMode, ShutdownReason};
pub use camera::{CaptureGuard, FrameSource, SyntheticCamera, SyntheticCameraBuilder};
pub use classifier::{build_classifier, Classifier, ClassifierScript, Observation, ScriptStep, ScriptedClassifier};
pub use config::{LingoLensConfig, PolicyKind};
pub use curation::{BlocklistCuration, DictionaryTranslator, ObjectCuration, QuizBuilder, TargetLanguage, Translator};
pub use error::{LingoLensError, Result};
pub use events::{EventBus, EventFilter, EventReceiver, LingoLensEvent};
pub use frame::{FrameData, FrameFormat};
pub use frame_buffer::FrameBuffer;
pub use quiz::{QuizItem, QuizMatchingEngine, QuizPhase, QuizSummary, ScoreGrade};
pub use rate_limiter::RateLimiter;
pub use session::{SessionCoordinator, SessionCoordinatorBuilder, SessionHandle, SessionSettings, SessionSnapshot};
pub use stabilizer::{DetectionStabilizer, StabilizationPolicy, StableLabel};
