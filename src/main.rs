use anyhow::{bail, Result};
use clap::Parser;
use lingolens::{LingoLensConfig, LingoLensOrchestrator, PolicyKind, RunMode};
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "lingolens")]
#[command(about = "Scan everyday objects, then get quizzed on their names in another language")]
#[command(version)]
#[command(long_about = "LingoLens watches a camera feed, turns noisy classifier output into a \
stable list of objects, and builds a vocabulary quiz from them. Each question shows a word in \
the target language; answer by pointing the camera at the matching object and tapping.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "lingolens.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - initialize but don't start components
    #[arg(long, help = "Perform dry run - initialize components but don't start them")]
    dry_run: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    #[arg(short, long, default_value = "full", help = "What to run: scan, quiz or full")]
    mode: RunMode,

    #[arg(short, long, value_name = "LANGUAGE", help = "Target language (name or code, e.g. es)")]
    language: Option<String>,

    #[arg(long, value_name = "FILE", help = "JSON classifier script to replay instead of the demo scene")]
    script: Option<String>,

    #[arg(long, value_name = "POLICY", help = "Scan stabilization policy: locked or candidate")]
    policy: Option<PolicyKind>,

    /// Labels to quiz on in quiz mode
    #[arg(long, value_delimiter = ',', help = "Comma-separated labels for quiz mode")]
    labels: Vec<String>,

    #[arg(
        long,
        value_name = "MS",
        num_args = 0..=1,
        default_missing_value = "500",
        help = "Attempt automatically every MS milliseconds instead of waiting for taps"
    )]
    auto_attempt: Option<u64>,

    #[arg(long, help = "Do not read the keyboard; only signals stop the run")]
    no_keyboard: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config();
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting LingoLens v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let mut config = match LingoLensConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    apply_overrides(&mut config, &args);

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    if args.mode == RunMode::Quiz && args.labels.is_empty() {
        bail!("quiz mode needs --labels, e.g. --labels chair,table,cup");
    }

    let mut orchestrator = LingoLensOrchestrator::new(config).await.map_err(|e| {
        error!("Failed to create orchestrator: {}", e);
        e
    })?;
    orchestrator.set_mode(args.mode);
    orchestrator.set_quiz_labels(args.labels.clone());
    orchestrator.set_auto_attempt(args.auto_attempt.map(Duration::from_millis));
    orchestrator.set_keyboard_enabled(!args.no_keyboard);

    orchestrator.initialize().await.map_err(|e| {
        error!("Failed to initialize: {}", e);
        e
    })?;

    if args.dry_run {
        println!("✓ Dry run completed successfully - all components initialized");
        return Ok(());
    }

    if !args.no_keyboard {
        println!("{}", lingolens::app::keyboard_input::KEY_HELP);
    }

    orchestrator.start().await.map_err(|e| {
        error!("Failed to start: {}", e);
        e
    })?;

    let exit_code = orchestrator.run().await.map_err(|e| {
        error!("Error during execution: {}", e);
        e
    })?;

    info!("LingoLens exited with code: {}", exit_code);
    std::process::exit(exit_code);
}

fn apply_overrides(config: &mut LingoLensConfig, args: &Args) {
    if let Some(language) = &args.language {
        config.quiz.target_language = language.clone();
    }
    if let Some(script) = &args.script {
        config.classifier.script_path = Some(script.clone());
    }
    if let Some(policy) = args.policy {
        config.stabilizer.policy = policy;
    }
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lingolens={}", log_level)));

    // Logs go to stderr so the quiz prompts on stdout stay readable
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() {
    println!("# LingoLens Configuration File");
    println!("# This is the default configuration with all available options");
    println!();

    let default_config = r#"[camera]
# Frames per second delivered by the capture source
fps = 30
# Frame resolution (width, height)
resolution = [640, 480]

[classifier]
# JSON script replayed by the classifier (optional, built-in demo scene otherwise)
# script_path = "scene.json"
# Simulated inference latency in milliseconds
latency_ms = 40

[stabilizer]
# Scan policy: "locked" (repeat sightings) or "candidate" (first sighting)
policy = "locked"
# Locked policy: confidence must exceed this, required_repeat_count times
confidence_threshold_locked = 0.70
required_repeat_count = 3
# Candidate policy: confidence threshold and results considered per frame
confidence_threshold_candidate = 0.30
top_k_per_frame = 5
# Minimum time between classifications while scanning
scan_interval_ms = 200

[quiz]
# French, Spanish, German or Japanese (or fr, es, de, ja)
target_language = "French"
# Shuffle questions
shuffle = true
# Attempts resolve as incorrect after this long (0 waits forever)
attempt_timeout_ms = 5000
# Generic labels never turned into questions
blocked_labels = [
    "consumer_electronics", "electronics", "device", "equipment", "machine", "system",
    "structure", "material", "object", "utensil", "furniture",
]
# Extra translations: [french] chair = "chaise"
# dictionary_path = "dictionary.toml"

[system]
# Event bus capacity
event_bus_capacity = 100
# Coordinator command queue capacity
command_queue_capacity = 32
# Scan phase length before the quiz (0 scans until 's' is pressed)
scan_duration_seconds = 20
"#;

    println!("{}", default_config);
}
