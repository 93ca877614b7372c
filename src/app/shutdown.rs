use super::{ComponentState, LingoLensOrchestrator};
use crate::error::{LingoLensError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info};

impl LingoLensOrchestrator {
    /// Stop input, then the session coordinator, then the camera
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        self.cancellation_token.cancel();
        let mut exit_code = 0;

        if self.keyboard_enabled {
            if let Err(e) = self.stop_keyboard().await {
                error!("Error stopping keyboard: {}", e);
                exit_code = 1;
            }
        }

        if let Err(e) = self.stop_session().await {
            error!("Error stopping session: {}", e);
            exit_code = 1;
        }

        if let Err(e) = self.stop_camera().await {
            error!("Error stopping camera: {}", e);
            exit_code = 1;
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    async fn stop_keyboard(&self) -> Result<()> {
        match &self.keyboard_handler {
            Some(keyboard_handler) => {
                self.stop_with_timeout("keyboard", Duration::from_secs(2), keyboard_handler.stop())
                    .await
            }
            None => {
                self.set_component_state("keyboard", ComponentState::Stopped).await;
                Ok(())
            }
        }
    }

    async fn stop_session(&mut self) -> Result<()> {
        let session = self.session();
        let task = self.coordinator_task.take();

        self.stop_with_timeout("session", Duration::from_secs(5), async move {
            if session.shutdown().await.is_err() {
                debug!("Session coordinator already closed");
            }
            if let Some(task) = task {
                task.await
                    .map_err(|e| LingoLensError::system(format!("Session task failed: {}", e)))?;
            }
            Ok(())
        })
        .await
    }

    async fn stop_camera(&mut self) -> Result<()> {
        match self.capture.take() {
            // A guard dropped on timeout still cancels capture
            Some(capture) => {
                self.stop_with_timeout("camera", Duration::from_secs(5), async move {
                    capture.stop().await;
                    Ok(())
                })
                .await
            }
            None => {
                self.set_component_state("camera", ComponentState::Stopped).await;
                Ok(())
            }
        }
    }

    async fn stop_with_timeout<F>(&self, component: &str, limit: Duration, stop: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        info!("Stopping {} component", component);
        self.set_component_state(component, ComponentState::Stopping).await;

        match timeout(limit, stop).await {
            Ok(Ok(())) => {
                self.set_component_state(component, ComponentState::Stopped).await;
                info!("{} component stopped", component);
                Ok(())
            }
            Ok(Err(e)) => {
                self.set_component_state(component, ComponentState::Failed).await;
                error!("Error stopping {} component: {}", component, e);
                Err(e)
            }
            Err(_) => {
                self.set_component_state(component, ComponentState::Failed).await;
                error!("{} component stop timeout", component);
                Err(LingoLensError::system(format!("{} component stop timeout", component)))
            }
        }
    }
}
