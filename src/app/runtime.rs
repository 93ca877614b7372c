use super::flow::{report, SessionFlow};
use super::{FlowOutcome, LingoLensOrchestrator, ShutdownReason};
use crate::error::{LingoLensError, Result};
use crate::events::LingoLensEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info, warn};

impl LingoLensOrchestrator {
    /// Run the session flow until it finishes or a signal arrives, then shut down
    pub async fn run(&mut self) -> Result<i32> {
        info!("LingoLens is running");

        let shutdown_sender = self
            .shutdown_sender
            .take()
            .ok_or_else(|| LingoLensError::system("Shutdown sender already taken"))?;

        let shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| LingoLensError::system("Shutdown receiver already taken"))?;

        self.setup_signal_handlers(shutdown_sender).await;

        let flow = SessionFlow::new(
            self.session(),
            self.event_bus(),
            self.mode,
            Duration::from_secs(self.config.system.scan_duration_seconds),
            self.auto_attempt,
            self.quiz_labels.clone(),
        );

        let shutdown_reason = tokio::select! {
            reason = shutdown_receiver => reason
                .map_err(|_| LingoLensError::system("Shutdown channel closed unexpectedly"))?,
            outcome = flow.run() => match outcome {
                Ok(outcome) => {
                    report(&outcome);
                    let reason = match &outcome {
                        FlowOutcome::Interrupted(reason) => reason.clone(),
                        _ => ShutdownReason::SessionFinished,
                    };
                    self.outcome = Some(outcome);
                    reason
                }
                Err(e) => {
                    error!("Session flow failed: {}", e);
                    let _ = self
                        .event_bus
                        .publish(LingoLensEvent::SystemError {
                            component: "session".to_string(),
                            error: e.to_string(),
                        })
                        .await;
                    ShutdownReason::Error(e.to_string())
                }
            },
        };

        info!("Shutdown initiated: {:?}", shutdown_reason);

        let mut exit_code = self.shutdown().await?;
        if matches!(shutdown_reason, ShutdownReason::Error(_)) {
            exit_code = 1;
        }

        info!("LingoLens shutdown complete");
        Ok(exit_code)
    }

    async fn setup_signal_handlers(&self, shutdown_sender: oneshot::Sender<ShutdownReason>) {
        let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));

        #[cfg(unix)]
        {
            let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
            tokio::spawn(async move {
                let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };

                if let Some(()) = sigterm.recv().await {
                    info!("Received SIGTERM signal");
                    if let Some(sender) = shutdown_sender_sigterm.lock().await.take() {
                        let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                    }
                }
            });
        }

        let shutdown_sender_sigint = Arc::clone(&shutdown_sender);
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                if let Some(sender) = shutdown_sender_sigint.lock().await.take() {
                    let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
                }
            }
        });
    }
}
