use crate::error::Result;
use crate::events::{EventBus, LingoLensEvent};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::runtime::Handle;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Keys understood by the terminal handler, printed at startup
pub const KEY_HELP: &str = "SPACE tap | a show answer | n next | s stop scan | q quit";

/// Map a key press onto the event it stands for
pub fn event_for_key(key: &KeyEvent) -> Option<LingoLensEvent> {
    let timestamp = SystemTime::now();

    match key.code {
        KeyCode::Char(' ') => Some(LingoLensEvent::TapDetected { timestamp }),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(LingoLensEvent::ShutdownRequested {
                timestamp,
                reason: "Ctrl+C from keyboard".to_string(),
            })
        }
        KeyCode::Char('a') | KeyCode::Char('A') => Some(LingoLensEvent::RevealRequested { timestamp }),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Enter => {
            Some(LingoLensEvent::NextRequested { timestamp })
        }
        KeyCode::Char('s') | KeyCode::Char('S') => Some(LingoLensEvent::StopScanRequested { timestamp }),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(LingoLensEvent::ShutdownRequested {
            timestamp,
            reason: "User requested via keyboard".to_string(),
        }),
        _ => None,
    }
}

/// Terminal stand-in for the touch surface: key presses become session events
pub struct KeyboardInputHandler {
    event_bus: Arc<EventBus>,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            event_bus,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!("Starting keyboard input handler ({})", KEY_HELP);

        let event_bus = Arc::clone(&self.event_bus);
        let cancellation_token = self.cancellation_token.clone();
        let runtime_handle = Handle::current();

        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            debug!("Raw mode enabled");

            while !cancellation_token.is_cancelled() {
                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }

                        let Some(mapped) = event_for_key(&key_event) else {
                            debug!("Key pressed: {:?}", key_event.code);
                            continue;
                        };

                        let quit = matches!(mapped, LingoLensEvent::ShutdownRequested { .. });
                        debug!("Key {:?} -> {}", key_event.code, mapped.event_type());

                        let event_bus = Arc::clone(&event_bus);
                        runtime_handle.spawn(async move {
                            if let Err(e) = event_bus.publish(mapped).await {
                                warn!("Failed to publish keyboard event: {}", e);
                            }
                        });

                        if quit {
                            break;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            }

            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Let the blocking task notice the cancellation and leave raw mode
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = disable_raw_mode();

        Ok(())
    }
}
