use log::{debug, info};

use crate::errors::SegmentationError;
use crate::translation::BatchTranslator;

use super::assembly::assemble;
use super::config::SegmentationConfig;
use super::grouping::group_tokens;
use super::model::{ConstraintWarning, Segment, SegmentationOutput, TimedToken};
use super::splitting::{SplitResult, split_segment};

/// Turns a timed token stream into numbered, validated cues.
///
/// The engine holds only its configuration; every run starts from scratch.
#[derive(Debug, Clone)]
pub struct SegmentationEngine {
    config: SegmentationConfig,
}

impl SegmentationEngine {
    /// Create an engine, rejecting unusable constraint parameters
    pub fn new(config: SegmentationConfig) -> Result<Self, SegmentationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Validate the tokens and group them into segments
    pub fn group(&self, tokens: &[TimedToken]) -> Result<Vec<Segment>, SegmentationError> {
        group_tokens(tokens, &self.config)
    }

    /// Split a single segment into unnumbered cues
    pub fn split(&self, segment: &Segment) -> SplitResult {
        split_segment(segment, &self.config)
    }

    /// Split every segment and assemble the final cue list
    ///
    /// `segment_warnings` carries warnings raised before splitting (translation fallbacks).
    pub fn build_cues(
        &self,
        segments: &[Segment],
        segment_warnings: Vec<ConstraintWarning>,
    ) -> Result<SegmentationOutput, SegmentationError> {
        let splits: Vec<SplitResult> = segments.iter().map(|segment| self.split(segment)).collect();
        assemble(splits, segment_warnings)
    }

    /// Full run without translation: cues show the source text
    pub fn process_untranslated(&self, tokens: &[TimedToken]) -> Result<SegmentationOutput, SegmentationError> {
        let segments = self.group(tokens)?;
        self.build_cues(&segments, Vec::new())
    }

    /// Full run: group, translate each segment once, split and assemble
    pub async fn process(
        &self,
        tokens: &[TimedToken],
        translator: &BatchTranslator,
    ) -> Result<SegmentationOutput, SegmentationError> {
        self.process_with_progress(tokens, translator, |_, _| {}).await
    }

    /// Same as `process`, reporting `(translated, total)` segment counts
    pub async fn process_with_progress<F>(
        &self,
        tokens: &[TimedToken],
        translator: &BatchTranslator,
        progress_callback: F,
    ) -> Result<SegmentationOutput, SegmentationError>
    where
        F: Fn(usize, usize) + Clone + Send + Sync,
    {
        let mut segments = self.group(tokens)?;
        debug!(
            "Translating {} segments into '{}'",
            segments.len(),
            translator.target_language()
        );

        let warnings = translator
            .translate_segments(&mut segments, progress_callback)
            .await?;
        let output = self.build_cues(&segments, warnings)?;

        info!(
            "Produced {} cues from {} segments ({} warnings)",
            output.cues.len(),
            output.segment_count,
            output.warnings.len()
        );
        Ok(output)
    }
}
