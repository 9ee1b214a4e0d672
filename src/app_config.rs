use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::segmentation::SegmentationConfig;
use crate::subtitle_formatter::OutputFormat;
use crate::translation::{BatchOptions, FailurePolicy};

/// Application configuration module
/// This module handles loading, validating and saving the JSON configuration,
/// and turning it into the explicit settings objects the pipeline runs with.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Scratch directory for extracted audio and transcripts; must already exist
    #[serde(default = "std::env::temp_dir")]
    pub temp_dir: PathBuf,

    /// Compute target for transcription
    #[serde(default)]
    pub device: Device,

    /// Whisper model name
    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,

    /// Half precision for whisper (cuda only)
    #[serde(default = "default_true")]
    pub whisper_fp16: bool,

    /// Whisper executable
    #[serde(default = "default_whisper_command")]
    pub whisper_command: String,

    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Upper bound on one ffmpeg run, in seconds
    #[serde(default = "default_ffmpeg_timeout_secs")]
    pub ffmpeg_timeout_secs: u64,

    /// Model used for translation
    #[serde(default = "default_translation_model")]
    pub translation_model: String,

    /// Subtitle syntax written to disk
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Per-line character cap
    #[serde(default = "default_max_chars_per_segment")]
    pub max_chars_per_segment: usize,

    /// Cue duration cap in seconds
    #[serde(default = "default_max_duration_seconds")]
    pub max_duration_seconds: f64,

    /// Lines per cue
    #[serde(default = "default_max_lines_per_block")]
    pub max_lines_per_block: usize,

    /// Grouping and floor settings
    #[serde(default)]
    pub segmentation: SegmentationSettings,

    /// Translation settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Also write the source-language subtitle file
    #[serde(default = "default_true")]
    pub emit_source_subtitles: bool,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Optional file receiving a plain copy of the log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Size in bytes at which the log file is rotated
    #[serde(default = "default_log_max_bytes")]
    pub log_max_bytes: u64,

    /// Rotated log files kept (`<log>.1` is the newest)
    #[serde(default = "default_log_backup_count")]
    pub log_backup_count: usize,
}

/// Compute device for the transcription model
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    #[default]
    Cuda,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}

impl std::str::FromStr for Device {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda),
            _ => Err(anyhow!("Invalid device: {} (choose cuda or cpu)", s)),
        }
    }
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: no translation, source text is copied
    None,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::None => "None (passthrough)",
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "none" => Ok(Self::None),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Grouping and readability settings beyond the three main caps
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SegmentationSettings {
    /// Shortest cue duration worth showing
    #[serde(default = "default_min_duration_seconds")]
    pub min_duration_seconds: f64,

    /// Silence that closes a segment
    #[serde(default = "default_pause_threshold_seconds")]
    pub pause_threshold_seconds: f64,

    /// Longest span a segment may reach before it is closed
    #[serde(default = "default_max_segment_span_seconds")]
    pub max_segment_span_seconds: f64,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            min_duration_seconds: default_min_duration_seconds(),
            pause_threshold_seconds: default_pause_threshold_seconds(),
            max_segment_span_seconds: default_max_segment_span_seconds(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Service URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Segments translated at once
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// What happens to a segment that cannot be translated
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff before the first retry (in milliseconds), doubled afterwards
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// HTTP timeout per request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// System prompt template for translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Reuse translations of identical segment texts
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            endpoint: default_ollama_endpoint(),
            concurrent_requests: default_concurrent_requests(),
            failure_policy: FailurePolicy::default(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
            cache_enabled: true,
        }
    }
}

impl TranslationConfig {
    /// Worker pool and retry settings for the batch translator
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            concurrent_requests: self.concurrent_requests,
            failure_policy: self.failure_policy,
            retry_count: self.retry_count,
            retry_backoff_ms: self.retry_backoff_ms,
            cache_enabled: self.cache_enabled,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "ml".to_string()
}

fn default_whisper_model() -> String {
    "medium.en".to_string()
}

fn default_whisper_command() -> String {
    "whisper".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffmpeg_timeout_secs() -> u64 {
    30 * 60
}

fn default_log_max_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_log_backup_count() -> usize {
    5
}

fn default_translation_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_max_chars_per_segment() -> usize {
    80
}

fn default_max_duration_seconds() -> f64 {
    7.0
}

fn default_max_lines_per_block() -> usize {
    2
}

fn default_min_duration_seconds() -> f64 {
    0.8
}

fn default_pause_threshold_seconds() -> f64 {
    1.0
}

fn default_max_segment_span_seconds() -> f64 {
    15.0
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_system_prompt() -> String {
    "You are a professional subtitle translator. Translate the following text from {source_language} to {target_language}. Reply with the translation only, keeping the meaning and tone of the original.".to_string()
}

impl Config {
    /// Read a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Read a configuration file, writing the defaults there first when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if path.exists() {
            return Ok((Self::from_file(path)?, false));
        }

        let config = Config::default();
        config.save(path)?;
        Ok((config, true))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.source_language)?;
        crate::language_utils::validate_language_code(&self.target_language)?;

        if !self.temp_dir.is_dir() {
            return Err(anyhow!(
                "temp_dir must be an existing directory: {}",
                self.temp_dir.display()
            ));
        }

        if self.whisper_model.trim().is_empty() {
            return Err(anyhow!("whisper_model cannot be empty"));
        }

        if self.translation.provider == TranslationProvider::Ollama {
            if self.translation_model.trim().is_empty() {
                return Err(anyhow!("translation_model cannot be empty for the Ollama provider"));
            }
            if self.translation.endpoint.trim().is_empty() {
                return Err(anyhow!("translation.endpoint cannot be empty for the Ollama provider"));
            }
        }

        if self.ffmpeg_timeout_secs == 0 {
            return Err(anyhow!("ffmpeg_timeout_secs must be at least 1"));
        }

        if self.log_file.is_some() && self.log_max_bytes == 0 {
            return Err(anyhow!("log_max_bytes must be at least 1 when log_file is set"));
        }

        if self.translation.concurrent_requests == 0 {
            return Err(anyhow!("translation.concurrent_requests must be at least 1"));
        }

        self.segmentation_config()
            .validate()
            .context("Invalid segmentation settings")?;

        Ok(())
    }

    /// Constraint object the segmentation engine is built with
    pub fn segmentation_config(&self) -> SegmentationConfig {
        SegmentationConfig {
            max_chars_per_segment: self.max_chars_per_segment,
            max_duration_seconds: self.max_duration_seconds,
            max_lines_per_block: self.max_lines_per_block,
            min_duration_seconds: self.segmentation.min_duration_seconds,
            pause_threshold_seconds: self.segmentation.pause_threshold_seconds,
            max_segment_span_seconds: self.segmentation.max_segment_span_seconds,
        }
    }

    pub fn ffmpeg_timeout(&self) -> Duration {
        Duration::from_secs(self.ffmpeg_timeout_secs)
    }

    /// fp16 only takes effect on cuda
    pub fn effective_fp16(&self) -> bool {
        self.whisper_fp16 && self.device == Device::Cuda
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            temp_dir: std::env::temp_dir(),
            device: Device::default(),
            whisper_model: default_whisper_model(),
            whisper_fp16: true,
            whisper_command: default_whisper_command(),
            ffmpeg_path: default_ffmpeg_path(),
            ffmpeg_timeout_secs: default_ffmpeg_timeout_secs(),
            translation_model: default_translation_model(),
            output_format: OutputFormat::default(),
            max_chars_per_segment: default_max_chars_per_segment(),
            max_duration_seconds: default_max_duration_seconds(),
            max_lines_per_block: default_max_lines_per_block(),
            segmentation: SegmentationSettings::default(),
            translation: TranslationConfig::default(),
            emit_source_subtitles: true,
            log_level: LogLevel::default(),
            log_file: None,
            log_max_bytes: default_log_max_bytes(),
            log_backup_count: default_log_backup_count(),
        }
    }
}
