use crate::classifier::{Classifier, Observation};
use crate::error::{LingoLensError, Result};
use crate::frame_buffer::FrameBuffer;
use crate::rate_limiter::RateLimiter;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Classifier output for one frame, tagged with the session that asked for it
#[derive(Debug, Clone)]
pub struct ScanBatch {
    pub generation: u64,
    pub frame_id: u64,
    pub observations: Vec<Observation>,
}

/// Background worker driving continuous-scan classification.
///
/// Pulls the latest frame from the [`FrameBuffer`] whenever the rate limiter
/// admits, classifies it on its own task and forwards non-empty results to
/// the coordinating context. It never touches stabilizer state itself.
pub struct ScanWorker {
    frame_buffer: Arc<FrameBuffer>,
    classifier: Arc<dyn Classifier>,
    scan_interval: Duration,
    results: mpsc::Sender<ScanBatch>,
    frames_classified: Arc<AtomicU64>,
    cancellation_token: Option<CancellationToken>,
    scan_task: Option<JoinHandle<()>>,
}

impl ScanWorker {
    pub fn new(
        frame_buffer: Arc<FrameBuffer>,
        classifier: Arc<dyn Classifier>,
        scan_interval: Duration,
        results: mpsc::Sender<ScanBatch>,
    ) -> Self {
        Self {
            frame_buffer,
            classifier,
            scan_interval,
            results,
            frames_classified: Arc::new(AtomicU64::new(0)),
            cancellation_token: None,
            scan_task: None,
        }
    }

    /// Start scanning on behalf of session `generation`
    pub fn start(&mut self, generation: u64) {
        if self.is_running() {
            warn!("Scan worker is already running");
            return;
        }

        info!(
            "Starting scan worker for generation {} (interval {:?})",
            generation, self.scan_interval
        );

        let token = CancellationToken::new();
        let frame_buffer = Arc::clone(&self.frame_buffer);
        let classifier = Arc::clone(&self.classifier);
        let results = self.results.clone();
        let frames_classified = Arc::clone(&self.frames_classified);
        let scan_interval = self.scan_interval;
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            let mut rate_limiter = RateLimiter::continuous(scan_interval);
            let mut last_frame_id = None;
            // Poll a little faster than the interval; the rate limiter sets the real pace
            let mut ticker = tokio::time::interval((scan_interval / 4).max(Duration::from_millis(5)));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        debug!("Scan worker for generation {} cancelled", generation);
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                let Some(frame) = frame_buffer.latest_newer_than(last_frame_id) else {
                    trace!("No new frame for scan worker");
                    continue;
                };

                if !rate_limiter.try_admit(Instant::now()) {
                    continue;
                }
                last_frame_id = Some(frame.id);

                let observations = tokio::select! {
                    _ = task_token.cancelled() => break,
                    result = classifier.classify(&frame) => match result {
                        Ok(observations) => observations,
                        Err(e) => {
                            debug!("Classifier {} failed on frame {}: {}", classifier.name(), frame.id, e);
                            continue;
                        }
                    },
                };
                frames_classified.fetch_add(1, Ordering::Relaxed);

                if observations.is_empty() {
                    trace!("Frame {} produced no observations", frame.id);
                    continue;
                }

                let batch = ScanBatch {
                    generation,
                    frame_id: frame.id,
                    observations,
                };

                // The receiver may be the task waiting on stop(); never block past cancellation
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    sent = results.send(batch) => {
                        if sent.is_err() {
                            debug!("Scan result receiver dropped, stopping scan worker");
                            break;
                        }
                    }
                }
            }

            info!("Scan worker for generation {} stopped", generation);
        });

        self.cancellation_token = Some(token);
        self.scan_task = Some(task);
    }

    /// Stop scanning; results already in flight are discarded by the receiver
    pub async fn stop(&mut self) {
        if let Some(token) = self.cancellation_token.take() {
            token.cancel();
        }

        if let Some(task) = self.scan_task.take() {
            if let Err(e) = task.await {
                warn!("Scan worker task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.scan_task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    pub fn frames_classified(&self) -> u64 {
        self.frames_classified.load(Ordering::Relaxed)
    }
}

/// Builder for ScanWorker
pub struct ScanWorkerBuilder {
    frame_buffer: Option<Arc<FrameBuffer>>,
    classifier: Option<Arc<dyn Classifier>>,
    scan_interval: Duration,
    results: Option<mpsc::Sender<ScanBatch>>,
}

impl ScanWorkerBuilder {
    pub fn new() -> Self {
        Self {
            frame_buffer: None,
            classifier: None,
            scan_interval: Duration::from_millis(200),
            results: None,
        }
    }

    pub fn frame_buffer(mut self, frame_buffer: Arc<FrameBuffer>) -> Self {
        self.frame_buffer = Some(frame_buffer);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn scan_interval(mut self, scan_interval: Duration) -> Self {
        self.scan_interval = scan_interval;
        self
    }

    pub fn results(mut self, results: mpsc::Sender<ScanBatch>) -> Self {
        self.results = Some(results);
        self
    }

    pub fn build(self) -> Result<ScanWorker> {
        let frame_buffer = self
            .frame_buffer
            .ok_or_else(|| LingoLensError::component("scan_worker_builder", "Frame buffer is required"))?;
        let classifier = self
            .classifier
            .ok_or_else(|| LingoLensError::component("scan_worker_builder", "Classifier is required"))?;
        let results = self
            .results
            .ok_or_else(|| LingoLensError::component("scan_worker_builder", "Result channel is required"))?;

        if self.scan_interval.is_zero() {
            return Err(LingoLensError::component(
                "scan_worker_builder",
                "Scan interval must be greater than 0",
            ));
        }

        Ok(ScanWorker::new(frame_buffer, classifier, self.scan_interval, results))
    }
}

impl Default for ScanWorkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
