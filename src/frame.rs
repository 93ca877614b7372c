use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

/// Pixel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// Compressed JPEG frames, as produced by the synthetic camera
    Mjpeg,
    /// 32-bit BGRA, as delivered by most phone capture pipelines
    Bgra,
}

/// Opaque handle to one captured image.
///
/// Frames have no identity beyond "most recent wins"; the `id` is a
/// monotonically increasing capture counter used only to tell whether a
/// consumer has already seen a frame.
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Capture sequence number
    pub id: u64,
    pub timestamp: SystemTime,
    /// Shared so handing a frame to a classification worker never copies pixels
    pub data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
}

impl FrameData {
    pub fn new(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
            format,
        }
    }
}
