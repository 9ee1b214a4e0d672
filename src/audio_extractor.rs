use anyhow::{Result, anyhow};
use log::{debug, error};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::{Builder, NamedTempFile};
use tokio::process::Command;

use crate::errors::AppError;

// @module: Audio track extraction with ffmpeg

/// Extracted audio; the file is deleted when this value is dropped
#[derive(Debug)]
pub struct ExtractedAudio {
    file: NamedTempFile,
}

impl ExtractedAudio {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

// @struct: ffmpeg runner producing 16 kHz mono PCM WAV
#[derive(Debug, Clone)]
pub struct AudioExtractor {
    ffmpeg_path: String,
    timeout: Duration,
}

impl AudioExtractor {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound the ffmpeg run
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// ffmpeg arguments for demuxing `video` into `output`
    pub fn build_args(video: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-vn".to_string(),
            "-acodec".to_string(),
            "pcm_s16le".to_string(),
            "-ar".to_string(),
            "16000".to_string(),
            "-ac".to_string(),
            "1".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Extract the audio track of `video` into a temporary WAV file inside `temp_dir`
    pub async fn extract_audio(&self, video: &Path, temp_dir: &Path) -> Result<ExtractedAudio, AppError> {
        if !video.is_file() {
            return Err(AppError::File(format!("Video file does not exist: {}", video.display())));
        }

        let file = Builder::new()
            .prefix("syncsub-audio-")
            .suffix(".wav")
            .tempfile_in(temp_dir)
            .map_err(|e| AppError::File(format!("Cannot create audio file in {}: {}", temp_dir.display(), e)))?;
        let output: PathBuf = file.path().to_path_buf();

        debug!("Extracting audio from {} to {}", video.display(), output.display());
        self.run_ffmpeg(&Self::build_args(video, &output))
            .await
            .map_err(|e| AppError::AudioExtraction(e.to_string()))?;

        let size = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(AppError::AudioExtraction(format!(
                "ffmpeg produced no audio for {}",
                video.display()
            )));
        }

        Ok(ExtractedAudio { file })
    }

    async fn run_ffmpeg(&self, args: &[String]) -> Result<()> {
        let ffmpeg_future = Command::new(&self.ffmpeg_path)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            result = ffmpeg_future => {
                result.map_err(|e| anyhow!("Failed to execute {}: {}", self.ffmpeg_path, e))?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(anyhow!("ffmpeg timed out after {:?}", self.timeout));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("Audio extraction failed: {}", filtered);
            return Err(anyhow!("ffmpeg failed: {}", filtered));
        }

        Ok(())
    }
}

/// Keep only the meaningful stderr lines, dropping the banner and stream listing
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    const NOISE_PREFIXES: &[&str] = &[
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
        "title",
        "encoder",
        "handler_name",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !NOISE_PREFIXES.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
