use crate::errors::SegmentationError;

/// Constraint parameters for grouping tokens and shaping cues.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationConfig {
    /// Per-line character cap (soft for single overlong words)
    pub max_chars_per_segment: usize,

    /// Upper bound on a cue's duration
    pub max_duration_seconds: f64,

    /// Maximum text lines per cue
    pub max_lines_per_block: usize,

    /// Readability floor for a cue's duration
    pub min_duration_seconds: f64,

    /// Silence between tokens that closes a segment
    pub pause_threshold_seconds: f64,

    /// Span ceiling that closes a segment regardless of punctuation
    pub max_segment_span_seconds: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            max_chars_per_segment: 80,
            max_duration_seconds: 7.0,
            max_lines_per_block: 2,
            min_duration_seconds: 0.8,
            pause_threshold_seconds: 1.0,
            max_segment_span_seconds: 15.0,
        }
    }
}

impl SegmentationConfig {
    /// Check that every parameter is usable, reporting the first problem
    pub fn validate(&self) -> Result<(), SegmentationError> {
        if self.max_chars_per_segment == 0 {
            return Err(invalid("max_chars_per_segment must be at least 1".to_string()));
        }
        if self.max_lines_per_block == 0 {
            return Err(invalid("max_lines_per_block must be at least 1".to_string()));
        }
        for (name, value) in [
            ("max_duration_seconds", self.max_duration_seconds),
            ("min_duration_seconds", self.min_duration_seconds),
            ("pause_threshold_seconds", self.pause_threshold_seconds),
            ("max_segment_span_seconds", self.max_segment_span_seconds),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{} must be a positive number, got {}", name, value)));
            }
        }
        if self.min_duration_seconds > self.max_duration_seconds {
            return Err(invalid(format!(
                "min_duration_seconds ({}) cannot exceed max_duration_seconds ({})",
                self.min_duration_seconds, self.max_duration_seconds
            )));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> SegmentationError {
    SegmentationError::InvalidConfig(reason)
}
