use thiserror::Error;

#[derive(Error, Debug)]
pub enum LingoLensError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("Quiz error: {0}")]
    Quiz(#[from] QuizError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

/// Failures reported by an image classifier
#[derive(Error, Debug, Clone)]
pub enum ClassifierError {
    #[error("Classifier unavailable: {details}")]
    Unavailable { details: String },

    #[error("Inference failed: {details}")]
    Inference { details: String },
}

/// Failures reported by the curation or translation capabilities
#[derive(Error, Debug, Clone)]
pub enum CapabilityError {
    #[error("{capability} is unavailable")]
    Unavailable { capability: &'static str },

    #[error("{capability} failed: {details}")]
    Failed {
        capability: &'static str,
        details: String,
    },
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Event channel closed")]
    ChannelClosed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("Cannot {operation} while quiz is {phase}")]
    InvalidTransition {
        phase: &'static str,
        operation: &'static str,
    },

    #[error("Attempt {attempt_id} is not the outstanding attempt")]
    StaleTicket { attempt_id: u64 },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session coordinator is no longer running")]
    CoordinatorClosed,

    #[error("No quiz session is active")]
    NoQuiz,
}

impl LingoLensError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LingoLensError>;
