use crate::quiz::QuizSummary;
use crate::stabilizer::StableLabel;
use std::fmt;
use std::str::FromStr;

/// Component lifecycle states
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
}

/// System shutdown reason
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    Signal(String),
    Error(String),
    UserRequest,
    SessionFinished,
}

/// Which part of the application flow to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Scan and list stable labels
    Scan,
    /// Quiz over labels given up front
    Quiz,
    /// Scan, then quiz over what was found
    Full,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scan" => Ok(RunMode::Scan),
            "quiz" => Ok(RunMode::Quiz),
            "full" => Ok(RunMode::Full),
            other => Err(format!("unknown mode '{}' (expected scan, quiz or full)", other)),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunMode::Scan => "scan",
            RunMode::Quiz => "quiz",
            RunMode::Full => "full",
        })
    }
}

/// How a run of the application flow ended
#[derive(Debug, Clone)]
pub enum FlowOutcome {
    Scanned(Vec<StableLabel>),
    QuizCompleted(QuizSummary),
    NothingToQuiz,
    Interrupted(ShutdownReason),
}
