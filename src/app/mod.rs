pub mod keyboard_input;

mod flow;
mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod types;

#[cfg(test)]
mod tests;

pub use orchestrator::LingoLensOrchestrator;
pub use types::{ComponentState, FlowOutcome, RunMode, ShutdownReason};
