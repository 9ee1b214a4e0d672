// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};

use syncsub::app_config::{self, Config, Device, TranslationProvider};
use syncsub::app_controller::Controller;
use syncsub::file_utils::RotatingLogFile;
use syncsub::translation::FailurePolicy;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    None,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::None => TranslationProvider::None,
        }
    }
}

/// CLI Wrapper for Device to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliDevice {
    Cpu,
    Cuda,
}

impl From<CliDevice> for Device {
    fn from(cli_device: CliDevice) -> Self {
        match cli_device {
            CliDevice::Cpu => Device::Cpu,
            CliDevice::Cuda => Device::Cuda,
        }
    }
}

/// CLI Wrapper for FailurePolicy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliFailurePolicy {
    Abort,
    Fallback,
}

impl From<CliFailurePolicy> for FailurePolicy {
    fn from(cli_policy: CliFailurePolicy) -> Self {
        match cli_policy {
            CliFailurePolicy::Abort => FailurePolicy::Abort,
            CliFailurePolicy::Fallback => FailurePolicy::Fallback,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for syncsub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Input video, transcript JSON, or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Directory receiving the subtitle files (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Scratch directory for extracted audio; must already exist
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Compute device for transcription
    #[arg(long, value_enum)]
    device: Option<CliDevice>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'ml', 'de', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// What to do when a segment cannot be translated
    #[arg(long, value_enum)]
    on_translation_failure: Option<CliFailurePolicy>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// syncsub - timed, translated subtitles from speech
#[derive(Parser, Debug)]
#[command(name = "syncsub")]
#[command(version)]
#[command(about = "Generate translated, readable subtitles from speech")]
#[command(long_about = "syncsub transcribes a video (or reads a word-timed transcript), groups the words into \
sentences, translates each sentence once and splits it into subtitle cues that respect line, \
length and duration limits.

EXAMPLES:
    syncsub movie.mkv                          # Transcribe and translate using conf.json
    syncsub -f movie.mkv                       # Force overwrite existing files
    syncsub -s en -t de movie.mkv              # Translate from English to German
    syncsub -p none talk.json                  # Segment a transcript without translating
    syncsub --on-translation-failure abort /videos/
    syncsub completions bash > syncsub.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
    log_file: Mutex<Option<RotatingLogFile>>,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<&'static CustomLogger, SetLoggerError> {
        let logger: &'static CustomLogger = Box::leak(Box::new(CustomLogger {
            level: LevelFilter::Trace,
            log_file: Mutex::new(None),
        }));
        log::set_logger(logger)?;
        log::set_max_level(level);
        Ok(logger)
    }

    // @sets: Plain-text copy of every record, rotated by size
    fn set_log_file(&self, log_file: Option<RotatingLogFile>) {
        *self.log_file.lock() = log_file;
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = chrono::Local::now().format("%H:%M:%S%.3f");
        let mut stderr = std::io::stderr();
        let _ = writeln!(
            stderr,
            "{}{} {:<5} {}\x1B[0m",
            Self::color_for_level(record.level()),
            now,
            record.level(),
            record.args()
        );

        if let Some(log_file) = self.log_file.lock().as_mut() {
            if let Err(e) = log_file.append(&format!("{:<5} {}", record.level(), record.args())) {
                let _ = writeln!(stderr, "Failed to write to {}: {:#}", log_file.path().display(), e);
            }
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let logger = CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "syncsub", &mut std::io::stdout());
            Ok(())
        }
        None => run(cli.run, logger).await,
    }
}

/// Load the configuration file and apply command line overrides
fn load_config(options: &RunArgs) -> Result<Config> {
    let (mut config, created) = Config::load_or_create(&options.config_path)?;
    if created {
        warn!(
            "Config file not found at '{}', created default config.",
            options.config_path.display()
        );
    }

    if let Some(temp_dir) = &options.temp_dir {
        config.temp_dir = temp_dir.clone();
    }
    if let Some(device) = &options.device {
        config.device = device.clone().into();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.translation_model = model.clone();
    }
    if let Some(policy) = &options.on_translation_failure {
        config.translation.failure_policy = policy.clone().into();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run(options: RunArgs, logger: &CustomLogger) -> Result<()> {
    if let Some(level) = &options.log_level {
        log::set_max_level(app_config::LogLevel::from(level.clone()).to_level_filter());
    }

    let input_path = options
        .input_path
        .clone()
        .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

    let config = load_config(&options)?;
    log::set_max_level(config.log_level.to_level_filter());
    logger.set_log_file(
        config
            .log_file
            .as_ref()
            .map(|path| RotatingLogFile::new(path, config.log_max_bytes, config.log_backup_count)),
    );

    info!(
        "syncsub {}: {} -> {} ({})",
        env!("CARGO_PKG_VERSION"),
        config.source_language,
        config.target_language,
        config.translation.failure_policy
    );

    let controller = Controller::with_config(config)?;

    if input_path.is_file() {
        let output_dir = match &options.output_dir {
            Some(dir) => dir.clone(),
            None => input_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."))
                .to_path_buf(),
        };
        controller
            .run(input_path, output_dir, options.force_overwrite)
            .await?;
    } else if input_path.is_dir() {
        let summary = controller
            .run_folder(input_path, options.output_dir.clone(), options.force_overwrite)
            .await?;
        if summary.has_failures() {
            return Err(anyhow!("{} file(s) failed to process", summary.failed));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}
