use super::source::{CaptureGuard, FrameSource};
use crate::config::CameraConfig;
use crate::error::{LingoLensError, Result};
use crate::frame::{FrameData, FrameFormat};
use crate::frame_buffer::FrameBuffer;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

/// Frame producer generating small MJPEG-shaped frames at the configured rate.
///
/// Stands in for a real capture device; the classifier never looks at pixel
/// content, only at the frame handle.
pub struct SyntheticCamera {
    config: CameraConfig,
    frames_produced: Arc<AtomicU64>,
}

impl SyntheticCamera {
    pub fn new(config: CameraConfig) -> Self {
        info!(
            "Initializing synthetic camera ({}x{} @ {}fps)",
            config.resolution.0, config.resolution.1, config.fps
        );

        Self {
            config,
            frames_produced: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / self.config.fps.max(1) as u64)
    }

    pub fn frames_produced(&self) -> u64 {
        self.frames_produced.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    fn synthesize(frame_id: u64) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00];
        let pattern_size = 256 + (frame_id % 256) as usize;
        data.extend(std::iter::repeat((frame_id % 256) as u8).take(pattern_size));
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }
}

#[async_trait]
impl FrameSource for SyntheticCamera {
    async fn start(&self, frame_buffer: Arc<FrameBuffer>) -> Result<CaptureGuard> {
        let (width, height) = self.config.resolution;
        let frame_interval = self.frame_interval();
        let frames_produced = Arc::clone(&self.frames_produced);
        let token = CancellationToken::new();
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(frame_interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            info!("Synthetic capture loop started");

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = interval_timer.tick() => {}
                }

                let frame_id = frame_buffer.next_frame_id();
                let data = Self::synthesize(frame_id);
                trace!("Generated synthetic frame {} ({} bytes)", frame_id, data.len());

                frame_buffer.publish(FrameData::new(
                    frame_id,
                    SystemTime::now(),
                    data,
                    width,
                    height,
                    FrameFormat::Mjpeg,
                ));
                frames_produced.fetch_add(1, Ordering::Relaxed);
            }

            info!("Synthetic capture loop stopped");
        });

        Ok(CaptureGuard::new(self.name(), token, task))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Builder for SyntheticCamera
pub struct SyntheticCameraBuilder {
    config: Option<CameraConfig>,
}

impl SyntheticCameraBuilder {
    pub fn new() -> Self {
        Self { config: None }
    }

    pub fn config(mut self, config: CameraConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<SyntheticCamera> {
        let config = self
            .config
            .ok_or_else(|| LingoLensError::system("Camera configuration must be specified"))?;

        if config.fps == 0 {
            return Err(LingoLensError::component("camera", "FPS must be greater than 0"));
        }

        Ok(SyntheticCamera::new(config))
    }
}

impl Default for SyntheticCameraBuilder {
    fn default() -> Self {
        Self::new()
    }
}
