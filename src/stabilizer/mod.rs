mod policy;
mod scanner;
mod stabilize;

pub use policy::StabilizationPolicy;
pub use scanner::{ScanBatch, ScanWorker, ScanWorkerBuilder};
pub use stabilize::{DetectionStabilizer, StabilizerStats, StableLabel};
