/*!
 * Timed token sources.
 *
 * `WhisperCli` runs the whisper command line tool with word timestamps and
 * reads its JSON output. `parse_transcript_json` also accepts a plain token
 * array, so prepared transcripts can be fed to the pipeline directly.
 */

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::app_config::Device;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::segmentation::TimedToken;

/// Extent given to tokens reported with zero length
const MIN_TOKEN_SECONDS: f64 = 0.01;

/// Produces the timed token stream for an audio file
#[async_trait]
pub trait Transcriber: Send + Sync + Debug {
    async fn transcribe(&self, audio: &Path) -> Result<Vec<TimedToken>, AppError>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranscriptDocument {
    Tokens(Vec<RawToken>),
    Whisper { segments: Vec<WhisperSegment> },
}

#[derive(Debug, Deserialize)]
struct RawToken {
    #[serde(alias = "word")]
    text: String,
    start: f64,
    end: f64,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    words: Vec<WhisperWord>,
}

#[derive(Debug, Deserialize)]
struct WhisperWord {
    word: String,
    start: f64,
    end: f64,
}

/// Parse a transcript: either `[{text,start,end}, ...]` or whisper's
/// `{"segments": [{"words": [{word,start,end}]}]}`
///
/// Segments without word timings become one phrase token. Blank tokens are
/// dropped; ordering is left as-is for the engine to check.
pub fn parse_transcript_json(content: &str) -> Result<Vec<TimedToken>, AppError> {
    let document: TranscriptDocument = serde_json::from_str(content)
        .map_err(|e| AppError::Transcription(format!("Unrecognized transcript JSON: {}", e)))?;

    let raw: Vec<(String, f64, f64)> = match document {
        TranscriptDocument::Tokens(tokens) => tokens.into_iter().map(|t| (t.text, t.start, t.end)).collect(),
        TranscriptDocument::Whisper { segments } => segments
            .into_iter()
            .flat_map(|segment| {
                if segment.words.is_empty() {
                    vec![(segment.text, segment.start, segment.end)]
                } else {
                    segment
                        .words
                        .into_iter()
                        .map(|w| (w.word, w.start, w.end))
                        .collect()
                }
            })
            .collect(),
    };

    let tokens: Vec<TimedToken> = raw
        .into_iter()
        .filter_map(|(text, start, end)| {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            let end = if end == start { start + MIN_TOKEN_SECONDS } else { end };
            Some(TimedToken::new(text, start, end))
        })
        .collect();

    debug!("Parsed {} tokens from transcript", tokens.len());
    Ok(tokens)
}

/// Read and parse a transcript JSON file
pub fn load_transcript_file<P: AsRef<Path>>(path: P) -> Result<Vec<TimedToken>, AppError> {
    let path = path.as_ref();
    let content = FileManager::read_to_string(path).map_err(|e| AppError::File(format!("{:#}", e)))?;
    parse_transcript_json(&content)
}

/// Whisper command line runner
#[derive(Debug, Clone)]
pub struct WhisperCli {
    command: String,
    model: String,
    device: Device,
    fp16: bool,
    language: String,
    temp_dir: PathBuf,
}

impl WhisperCli {
    pub fn new(
        command: impl Into<String>,
        model: impl Into<String>,
        device: Device,
        fp16: bool,
        language: impl Into<String>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            command: command.into(),
            model: model.into(),
            device,
            fp16,
            language: language.into(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Command line arguments for one run
    pub fn build_args(&self, audio: &Path, output_dir: &Path) -> Vec<String> {
        // Half precision only exists on the GPU
        let fp16 = self.fp16 && self.device == Device::Cuda;
        vec![
            audio.to_string_lossy().to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--device".to_string(),
            self.device.to_string(),
            "--fp16".to_string(),
            if fp16 { "True" } else { "False" }.to_string(),
            "--language".to_string(),
            self.language.clone(),
            "--word_timestamps".to_string(),
            "True".to_string(),
            "--output_format".to_string(),
            "json".to_string(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl Transcriber for WhisperCli {
    async fn transcribe(&self, audio: &Path) -> Result<Vec<TimedToken>, AppError> {
        let output_dir = tempfile::Builder::new()
            .prefix("syncsub-whisper-")
            .tempdir_in(&self.temp_dir)
            .map_err(|e| AppError::File(format!("Cannot create whisper output dir: {}", e)))?;

        info!(
            "Transcribing with whisper model '{}' on {} (fp16: {})",
            self.model,
            self.device,
            self.fp16 && self.device == Device::Cuda
        );

        let output = Command::new(&self.command)
            .args(self.build_args(audio, output_dir.path()))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::Transcription(format!("Failed to execute {}: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            return Err(AppError::Transcription(format!(
                "whisper exited with {}: {}",
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join("\n")
            )));
        }

        let stem = audio.file_stem().unwrap_or_default().to_string_lossy().to_string();
        let json_path = output_dir.path().join(format!("{}.json", stem));
        let tokens = load_transcript_file(&json_path)?;
        if tokens.is_empty() {
            warn!("Whisper produced no speech for {}", audio.display());
        }
        Ok(tokens)
    }
}
