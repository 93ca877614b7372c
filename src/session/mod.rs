//! Single-writer coordination of scanning and quiz sessions.
//!
//! All `StableLabel` and quiz state lives on the coordinator task. Other
//! tasks talk to it through a [`SessionHandle`]; classification and
//! translation run on spawned workers whose results come back tagged with
//! the generation of the session that asked for them.

mod coordinator;
mod generation;
mod handle;


pub use coordinator::{SessionCoordinator, SessionCoordinatorBuilder, SessionSettings};
pub use generation::Generation;
pub use handle::{QuizSnapshot, SessionHandle, SessionSnapshot};
