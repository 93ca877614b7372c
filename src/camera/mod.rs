//! Capture collaborator boundary.
//!
//! A [`FrameSource`] pushes frames into the [`crate::frame_buffer::FrameBuffer`]
//! on its own task until the returned [`CaptureGuard`] is stopped or dropped.

mod source;
mod synthetic;

#[cfg(test)]
mod tests;

pub use source::{CaptureGuard, FrameSource};
pub use synthetic::{SyntheticCamera, SyntheticCameraBuilder};
