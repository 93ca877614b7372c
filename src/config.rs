use crate::curation::TargetLanguage;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LingoLensConfig {
    pub camera: CameraConfig,
    pub classifier: ClassifierConfig,
    pub stabilizer: StabilizerConfig,
    pub quiz: QuizConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Frames per second delivered by the capture source
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// Frame resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClassifierConfig {
    /// JSON script replayed by the scripted classifier
    #[serde(default)]
    pub script_path: Option<String>,

    /// Simulated inference latency in milliseconds
    #[serde(default = "default_classifier_latency_ms")]
    pub latency_ms: u64,
}

/// Which stabilization policy the scanning flow uses
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Locked,
    Candidate,
}

impl std::str::FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "locked" => Ok(PolicyKind::Locked),
            "candidate" => Ok(PolicyKind::Candidate),
            other => Err(format!("unknown stabilization policy '{}'", other)),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StabilizerConfig {
    /// Stabilization policy for the scanning flow
    #[serde(default = "default_policy")]
    pub policy: PolicyKind,

    /// Confidence a detection must exceed to count towards a lock
    #[serde(default = "default_confidence_threshold_locked")]
    pub confidence_threshold_locked: f32,

    /// Confidence a detection must exceed to be offered as a candidate
    #[serde(default = "default_confidence_threshold_candidate")]
    pub confidence_threshold_candidate: f32,

    /// Qualifying detections needed before a label locks
    #[serde(default = "default_required_repeat_count")]
    pub required_repeat_count: u32,

    /// Minimum spacing between continuous-scan classifications
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,

    /// Ranked results considered per frame by the candidate policy
    #[serde(default = "default_top_k_per_frame")]
    pub top_k_per_frame: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QuizConfig {
    /// Language prompts are shown in (display name or ISO code)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Randomize question order before the quiz starts
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,

    /// Give up on a detection attempt after this many milliseconds (0 waits forever)
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    /// Generic labels never turned into questions
    #[serde(default = "default_blocked_labels")]
    pub blocked_labels: Vec<String>,

    /// TOML dictionary used by the built-in translator
    #[serde(default)]
    pub dictionary_path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,

    /// Coordinator command queue capacity
    #[serde(default = "default_command_queue_capacity")]
    pub command_queue_capacity: usize,

    /// How long the scan phase runs before curation when not stopped by hand
    #[serde(default = "default_scan_duration_seconds")]
    pub scan_duration_seconds: u64,
}

impl StabilizerConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }
}

impl QuizConfig {
    pub fn attempt_timeout(&self) -> Option<Duration> {
        match self.attempt_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn language(&self) -> Result<TargetLanguage, ConfigError> {
        self.target_language
            .parse::<TargetLanguage>()
            .map_err(ConfigError::Message)
    }
}

impl LingoLensConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("lingolens.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.fps", default_camera_fps())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("classifier.latency_ms", default_classifier_latency_ms())?
            .set_default("stabilizer.policy", "locked")?
            .set_default(
                "stabilizer.confidence_threshold_locked",
                default_confidence_threshold_locked() as f64,
            )?
            .set_default(
                "stabilizer.confidence_threshold_candidate",
                default_confidence_threshold_candidate() as f64,
            )?
            .set_default(
                "stabilizer.required_repeat_count",
                default_required_repeat_count(),
            )?
            .set_default("stabilizer.scan_interval_ms", default_scan_interval_ms())?
            .set_default(
                "stabilizer.top_k_per_frame",
                default_top_k_per_frame() as i64,
            )?
            .set_default("quiz.target_language", default_target_language())?
            .set_default("quiz.shuffle", default_shuffle())?
            .set_default("quiz.attempt_timeout_ms", default_attempt_timeout_ms())?
            .set_default("quiz.blocked_labels", default_blocked_labels())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .set_default(
                "system.command_queue_capacity",
                default_command_queue_capacity() as i64,
            )?
            .set_default(
                "system.scan_duration_seconds",
                default_scan_duration_seconds(),
            )?
            .add_source(File::with_name(&path_str).required(false))
            // LINGOLENS_STABILIZER__POLICY=candidate
            .add_source(
                Environment::with_prefix("LINGOLENS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: LingoLensConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            (
                "confidence_threshold_locked",
                self.stabilizer.confidence_threshold_locked,
            ),
            (
                "confidence_threshold_candidate",
                self.stabilizer.confidence_threshold_candidate,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Message(format!(
                    "Stabilizer {} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.stabilizer.required_repeat_count == 0 {
            return Err(ConfigError::Message(
                "Stabilizer required_repeat_count must be greater than 0".to_string(),
            ));
        }

        if self.stabilizer.scan_interval_ms == 0 {
            return Err(ConfigError::Message(
                "Stabilizer scan_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.stabilizer.top_k_per_frame == 0 {
            return Err(ConfigError::Message(
                "Stabilizer top_k_per_frame must be greater than 0".to_string(),
            ));
        }

        self.quiz.language()?;

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        if self.system.command_queue_capacity == 0 {
            return Err(ConfigError::Message(
                "Command queue capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for LingoLensConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                fps: default_camera_fps(),
                resolution: default_camera_resolution(),
            },
            classifier: ClassifierConfig {
                script_path: None,
                latency_ms: default_classifier_latency_ms(),
            },
            stabilizer: StabilizerConfig {
                policy: default_policy(),
                confidence_threshold_locked: default_confidence_threshold_locked(),
                confidence_threshold_candidate: default_confidence_threshold_candidate(),
                required_repeat_count: default_required_repeat_count(),
                scan_interval_ms: default_scan_interval_ms(),
                top_k_per_frame: default_top_k_per_frame(),
            },
            quiz: QuizConfig {
                target_language: default_target_language(),
                shuffle: default_shuffle(),
                attempt_timeout_ms: default_attempt_timeout_ms(),
                blocked_labels: default_blocked_labels(),
                dictionary_path: None,
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
                command_queue_capacity: default_command_queue_capacity(),
                scan_duration_seconds: default_scan_duration_seconds(),
            },
        }
    }
}

// Default value functions
fn default_camera_fps() -> u32 {
    30
}
fn default_camera_resolution() -> (u32, u32) {
    (640, 480)
}

fn default_classifier_latency_ms() -> u64 {
    40
}

fn default_policy() -> PolicyKind {
    PolicyKind::Locked
}
fn default_confidence_threshold_locked() -> f32 {
    0.70
}
fn default_confidence_threshold_candidate() -> f32 {
    0.30
}
fn default_required_repeat_count() -> u32 {
    3
}
fn default_scan_interval_ms() -> u64 {
    200
}
fn default_top_k_per_frame() -> usize {
    5
}

fn default_target_language() -> String {
    "French".to_string()
}
fn default_shuffle() -> bool {
    true
}
fn default_attempt_timeout_ms() -> u64 {
    5000
}
pub(crate) fn default_blocked_labels() -> Vec<String> {
    [
        "consumer_electronics",
        "electronics",
        "device",
        "equipment",
        "machine",
        "system",
        "structure",
        "material",
        "object",
        "utensil",
        "furniture",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_event_bus_capacity() -> usize {
    100
}
fn default_command_queue_capacity() -> usize {
    32
}
fn default_scan_duration_seconds() -> u64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = LingoLensConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.stabilizer.policy, PolicyKind::Locked);
        assert_eq!(config.stabilizer.required_repeat_count, 3);
        assert_eq!(config.stabilizer.top_k_per_frame, 5);
        assert!((config.stabilizer.confidence_threshold_locked - 0.70).abs() < f32::EPSILON);
        assert!((config.stabilizer.confidence_threshold_candidate - 0.30).abs() < f32::EPSILON);
        assert_eq!(config.quiz.language().unwrap(), TargetLanguage::French);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[stabilizer]
policy = "candidate"
top_k_per_frame = 3

[quiz]
target_language = "es"
shuffle = false
"#
        )
        .unwrap();

        let config = LingoLensConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.stabilizer.policy, PolicyKind::Candidate);
        assert_eq!(config.stabilizer.top_k_per_frame, 3);
        assert_eq!(config.stabilizer.required_repeat_count, 3);
        assert!(!config.quiz.shuffle);
        assert_eq!(config.quiz.language().unwrap(), TargetLanguage::Spanish);
        assert_eq!(config.camera.fps, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LingoLensConfig::load_from_file(dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.system.event_bus_capacity, 100);
        assert_eq!(config.quiz.blocked_labels, default_blocked_labels());
    }

    #[test]
    fn test_config_validation() {
        let mut config = LingoLensConfig::default();

        config.stabilizer.confidence_threshold_locked = 1.5;
        assert!(config.validate().is_err());
        config.stabilizer.confidence_threshold_locked = 0.7;

        config.stabilizer.required_repeat_count = 0;
        assert!(config.validate().is_err());
        config.stabilizer.required_repeat_count = 3;

        config.quiz.target_language = "Klingon".to_string();
        assert!(config.validate().is_err());
        config.quiz.target_language = "de".to_string();

        config.quiz.attempt_timeout_ms = 0;
        assert!(config.validate().is_ok());
        assert!(config.quiz.attempt_timeout().is_none());
    }

    #[test]
    fn test_policy_kind_parse() {
        assert_eq!("Locked".parse::<PolicyKind>().unwrap(), PolicyKind::Locked);
        assert_eq!(
            " candidate ".parse::<PolicyKind>().unwrap(),
            PolicyKind::Candidate
        );
        assert!("sticky".parse::<PolicyKind>().is_err());
    }
}
