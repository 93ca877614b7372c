use crate::error::Result;
use crate::frame_buffer::FrameBuffer;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Something that delivers frames at camera rate
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Begin delivering frames into `frame_buffer`
    async fn start(&self, frame_buffer: Arc<FrameBuffer>) -> Result<CaptureGuard>;

    fn name(&self) -> &str;
}

/// Handle on a running capture task.
///
/// Dropping the guard cancels the task, so the device is released on every
/// exit path; `stop` additionally waits for the task to finish.
pub struct CaptureGuard {
    name: String,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CaptureGuard {
    pub fn new(name: &str, token: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            name: name.to_string(),
            token,
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Stop capture and wait up to three seconds for the task to exit
    pub async fn stop(mut self) {
        info!("Stopping {} capture", self.name);
        self.token.cancel();

        if let Some(task) = self.task.take() {
            match tokio::time::timeout(Duration::from_secs(3), task).await {
                Ok(Ok(())) => debug!("{} capture task completed", self.name),
                Ok(Err(e)) => error!("Error waiting for {} capture task: {}", self.name, e),
                Err(_) => warn!("{} capture task did not complete within timeout", self.name),
            }
        }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if !self.token.is_cancelled() {
            debug!("Capture guard for {} dropped, cancelling capture", self.name);
            self.token.cancel();
        }
    }
}
