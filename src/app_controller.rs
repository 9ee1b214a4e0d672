use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, TranslationProvider};
use crate::audio_extractor::AudioExtractor;
use crate::file_utils::{FileManager, FileType};
use crate::language_utils;
use crate::segmentation::{SegmentationEngine, SegmentationOutput, TimedToken};
use crate::subtitle_formatter::SrtFormatter;
use crate::transcriber::{Transcriber, WhisperCli, load_transcript_file};
use crate::translation::{BatchTranslator, FailurePolicy, OllamaTranslator, PassthroughTranslator, Translator};

// @module: Application controller for subtitle generation

/// Outcome of one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Subtitle files written
    Written(Vec<PathBuf>),
    /// Output already present and overwrite not forced
    Skipped(PathBuf),
}

/// Counts reported after a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Main application controller: input file in, subtitle files out
#[derive(Debug)]
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Constraint engine built from the config
    engine: SegmentationEngine,
    // @field: Worker pool around the configured translator
    translator: BatchTranslator,
    // @field: Speech to tokens
    transcriber: Arc<dyn Transcriber>,
    // @field: Video to audio
    audio_extractor: AudioExtractor,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let translator: Arc<dyn Translator> = match config.translation.provider {
            TranslationProvider::Ollama => Arc::new(
                OllamaTranslator::new(
                    &config.translation.endpoint,
                    config.translation_model.clone(),
                    config.translation.system_prompt.clone(),
                    config.translation.temperature,
                    config.translation.timeout(),
                )
                .context("Failed to create the Ollama translator")?,
            ),
            TranslationProvider::None => Arc::new(PassthroughTranslator),
        };

        let transcriber = Arc::new(WhisperCli::new(
            config.whisper_command.clone(),
            config.whisper_model.clone(),
            config.device,
            config.whisper_fp16,
            config.source_language.clone(),
            config.temp_dir.clone(),
        ));

        Self::with_components(config, translator, transcriber)
    }

    /// Create a controller around explicit collaborators
    pub fn with_components(
        config: Config,
        translator: Arc<dyn Translator>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Result<Self> {
        let engine = SegmentationEngine::new(config.segmentation_config())
            .context("Invalid segmentation settings")?;
        let translator = BatchTranslator::new(
            translator,
            config.source_language.clone(),
            config.target_language.clone(),
            config.translation.batch_options(),
        );
        let audio_extractor = AudioExtractor::new(config.ffmpeg_path.clone()).with_timeout(config.ffmpeg_timeout());

        Ok(Self {
            config,
            engine,
            translator,
            transcriber,
            audio_extractor,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process one video or transcript file
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<RunOutcome> {
        self.check_translator().await?;
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, &output_dir, &multi_progress, force_overwrite)
            .await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<RunOutcome> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let extension = self.config.output_format.extension();
        let target_path = FileManager::generate_output_path(
            input_file,
            output_dir,
            &self.config.target_language,
            extension,
        );
        if target_path.exists() && !force_overwrite {
            warn!(
                "Skipping {}, subtitles already exist (use -f to force overwrite)",
                target_path.display()
            );
            return Ok(RunOutcome::Skipped(target_path));
        }

        FileManager::ensure_dir(output_dir)?;

        let tokens = self.load_tokens(input_file).await?;
        if tokens.is_empty() {
            warn!("No speech found in {}", input_file.display());
        }

        let mut segments = self.engine.group(&tokens)?;
        debug!("Grouped {} tokens into {} segments", tokens.len(), segments.len());

        let mut written = Vec::new();

        let write_source = self.config.emit_source_subtitles
            && !language_utils::language_codes_match(&self.config.source_language, &self.config.target_language);
        if write_source {
            let source_output = self.engine.build_cues(&segments, Vec::new())?;
            let source_path = FileManager::generate_output_path(
                input_file,
                output_dir,
                &self.config.source_language,
                extension,
            );
            self.save_output(&source_output, &source_path)?;
            written.push(source_path);
        }

        info!(
            "Translating {} segments: {} - {}",
            segments.len(),
            self.config.translation.provider.display_name(),
            self.config.translation_model
        );
        let progress_bar = multi_progress.add(ProgressBar::new(segments.len() as u64));
        progress_bar.set_style(Self::bar_style("segments"));
        progress_bar.set_message("Translating");

        let pb = progress_bar.clone();
        let warnings = self
            .translator
            .translate_segments(&mut segments, move |completed, _total| {
                pb.set_position(completed as u64);
            })
            .await;
        progress_bar.finish_and_clear();

        let output = self.engine.build_cues(&segments, warnings?)?;
        self.save_output(&output, &target_path)?;
        written.push(target_path);

        let (hits, misses, _) = self.translator.cache().stats();
        if hits > 0 {
            debug!("Translation cache: {} hits, {} misses", hits, misses);
        }

        info!(
            "Finished {} in {}",
            input_file.display(),
            Self::format_duration(start_time.elapsed())
        );
        Ok(RunOutcome::Written(written))
    }

    /// Probe the translation backend once before any segment is sent
    ///
    /// An unreachable backend fails the run under `abort`; under `fallback` the
    /// run continues and every segment keeps its source text.
    async fn check_translator(&self) -> Result<()> {
        let name = self.translator.translator_name().to_string();
        match self.translator.health_check().await {
            Ok(()) => {
                debug!("Translation backend {} is reachable", name);
                Ok(())
            }
            Err(e) => match self.config.translation.failure_policy {
                FailurePolicy::Abort => Err(e).with_context(|| {
                    format!(
                        "Translation backend {} is not reachable at {}",
                        name, self.config.translation.endpoint
                    )
                }),
                FailurePolicy::Fallback => {
                    error!(
                        "Translation backend {} is not reachable at {} ({}); subtitles will keep the source text",
                        name, self.config.translation.endpoint, e
                    );
                    Ok(())
                }
            },
        }
    }

    /// Produce the token stream for an input file
    async fn load_tokens(&self, input_file: &Path) -> Result<Vec<TimedToken>> {
        match FileManager::detect_file_type(input_file)? {
            FileType::Transcript => {
                info!("Reading transcript {}", input_file.display());
                Ok(load_transcript_file(input_file)?)
            }
            FileType::Video => {
                FileManager::ensure_writable_dir(&self.config.temp_dir)?;
                info!("Extracting audio from {}", input_file.display());
                let audio = self
                    .audio_extractor
                    .extract_audio(input_file, &self.config.temp_dir)
                    .await?;
                let tokens = self.transcriber.transcribe(audio.path()).await?;
                Ok(tokens)
            }
            FileType::Unknown => Err(anyhow!("Unsupported input file: {}", input_file.display())),
        }
    }

    /// Write cues and surface their warnings
    fn save_output(&self, output: &SegmentationOutput, path: &Path) -> Result<()> {
        for warning in &output.warnings {
            warn!("{}", warning);
        }
        SrtFormatter::write_to_file(&output.cues, path)?;
        info!("Success: {} ({} cues)", path.display(), output.cues.len());
        Ok(())
    }

    /// Process every supported input directly inside `input_dir`, smallest first
    ///
    /// Outputs go next to each input unless `output_dir` is given. A failing file
    /// is logged and counted, and the remaining files are still processed.
    pub async fn run_folder(
        &self,
        input_dir: PathBuf,
        output_dir: Option<PathBuf>,
        force_overwrite: bool,
    ) -> Result<BatchSummary> {
        let start_time = Instant::now();
        let inputs = FileManager::find_inputs_sorted_by_size(&input_dir)?;
        if inputs.is_empty() {
            return Err(anyhow!("No video or transcript files found in directory: {:?}", input_dir));
        }
        self.check_translator().await?;

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(inputs.len() as u64));
        folder_pb.set_style(Self::bar_style("files"));
        folder_pb.set_message("Processing files");

        let mut summary = BatchSummary::default();
        for input in &inputs {
            let file_name = input
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let target_dir = match &output_dir {
                Some(dir) => dir.clone(),
                None => input.parent().map(Path::to_path_buf).unwrap_or_else(|| input_dir.clone()),
            };

            match self
                .run_with_progress(input, &target_dir, &multi_progress, force_overwrite)
                .await
            {
                Ok(RunOutcome::Written(_)) => summary.processed += 1,
                Ok(RunOutcome::Skipped(_)) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.failed += 1;
                }
            }
            folder_pb.inc(1);
        }
        folder_pb.finish_with_message("Folder processing complete");

        info!(
            "Folder processing completed in {}: {} processed, {} skipped, {} errors",
            Self::format_duration(start_time.elapsed()),
            summary.processed,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }

    fn bar_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
