use super::{ComponentState, LingoLensOrchestrator};
use crate::error::{CapabilityError, LingoLensError, Result};
use crate::events::LingoLensEvent;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

impl LingoLensOrchestrator {
    /// Register every component in the stopped state
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing LingoLens components");

        let mut states = self.component_states.lock().await;
        states.insert("camera".to_string(), ComponentState::Stopped);
        states.insert("session".to_string(), ComponentState::Stopped);

        if self.keyboard_enabled {
            states.insert("keyboard".to_string(), ComponentState::Stopped);
        }
        drop(states);

        info!("All components initialized successfully");
        Ok(())
    }

    /// Start camera capture, the session coordinator and input handling
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting LingoLens ({} mode)", self.mode);

        self.set_component_state("camera", ComponentState::Starting).await;
        let capture = match self.camera.start(self.frame_buffer()).await {
            Ok(capture) => capture,
            Err(e) => {
                error!("Failed to start camera: {}", e);
                self.set_component_state("camera", ComponentState::Failed).await;
                self.report_failure("camera", &e).await;
                return Err(e);
            }
        };
        self.capture = Some(capture);

        if let Err(e) = self.wait_for_frames(Duration::from_secs(5)).await {
            error!("Camera failed to produce frames: {}", e);
            self.set_component_state("camera", ComponentState::Failed).await;
            self.report_failure("camera", &e).await;
            return Err(e);
        }
        self.set_component_state("camera", ComponentState::Running).await;
        info!("Camera {} started", self.camera.name());

        if let Some(coordinator) = self.coordinator.take() {
            self.set_component_state("session", ComponentState::Starting).await;
            self.coordinator_task = Some(coordinator.spawn());
            self.set_component_state("session", ComponentState::Running).await;
            info!("Session coordinator started");
        }

        if self.keyboard_enabled {
            if let Some(keyboard_handler) = &self.keyboard_handler {
                self.set_component_state("keyboard", ComponentState::Starting).await;

                keyboard_handler.start().await.map_err(|e| {
                    error!("Failed to start keyboard handler: {}", e);
                    e
                })?;

                self.set_component_state("keyboard", ComponentState::Running).await;
            }
        }

        info!("LingoLens started successfully");
        Ok(())
    }

    async fn report_failure(&self, component: &str, error: &LingoLensError) {
        let event = LingoLensEvent::SystemError {
            component: component.to_string(),
            error: error.to_string(),
        };
        if let Err(e) = self.event_bus.publish(event).await {
            debug!("System error not delivered: {}", e);
        }
    }

    async fn wait_for_frames(&self, limit: Duration) -> Result<()> {
        let started = Instant::now();

        while !self.frame_buffer.has_frame() {
            if started.elapsed() >= limit {
                return Err(CapabilityError::Failed {
                    capability: "camera",
                    details: format!("no frame within {:?}", limit),
                }
                .into());
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        Ok(())
    }
}
