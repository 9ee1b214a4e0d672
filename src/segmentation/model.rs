/*!
 * Data model of the segmentation engine.
 *
 * - `TimedToken`: one transcribed word or phrase with its time interval
 * - `Segment`: consecutive tokens forming one translatable unit
 * - `Cue`: a finished subtitle block
 * - `ConstraintWarning`: a recoverable constraint relaxation attached to the output
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// A transcribed word or short phrase with a `[start, end)` interval in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedToken {
    /// Token text as produced by the transcriber
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,
}

impl TimedToken {
    /// Create a new token
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Duration of the token interval
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A sentence-level group of tokens, the unit of translation
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Tokens in transcription order (never empty)
    pub tokens: Vec<TimedToken>,

    /// Span start, equal to the first token's start
    pub start: f64,

    /// Span end; the last token's end unless clipped against the next segment
    pub end: f64,

    /// Token texts joined with natural spacing
    pub source_text: String,

    /// Filled in once by the translator
    pub translated_text: Option<String>,
}

impl Segment {
    /// Duration of the segment span
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Text that ends up on screen: the translation when present, the source otherwise
    pub fn display_text(&self) -> &str {
        match &self.translated_text {
            Some(text) if !text.trim().is_empty() => text,
            _ => &self.source_text,
        }
    }
}

/// A finalized, displayable subtitle block
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// One-based sequential index
    pub index: usize,

    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Text lines, top to bottom
    pub lines: Vec<String>,
}

impl Cue {
    /// Duration of the cue
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Displayed characters, newlines excluded
    pub fn char_count(&self) -> usize {
        self.lines.iter().map(|line| line.chars().count()).sum()
    }

    /// Lines joined the way they are rendered
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Kinds of recoverable constraint relaxations
#[derive(Debug, Clone, PartialEq)]
pub enum WarningKind {
    /// A single word is longer than the per-line character cap
    LineTooLong { line: String, chars: usize, max_chars: usize },

    /// A merged cue holds more lines than allowed
    LineCapRelaxed { lines: usize, max_lines: usize },

    /// A cue lasts longer than the duration cap
    DurationCapRelaxed { duration: f64, max_duration: f64 },

    /// A cue is shorter than the readability floor
    BelowMinimumDuration { duration: f64, min_duration: f64 },

    /// The translator failed and the source text was used instead
    TranslationFallback { error: String },
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::LineTooLong { line, chars, max_chars } => {
                write!(f, "line of {} chars exceeds cap of {}: '{}'", chars, max_chars, line)
            }
            WarningKind::LineCapRelaxed { lines, max_lines } => {
                write!(f, "merged cue has {} lines (max {})", lines, max_lines)
            }
            WarningKind::DurationCapRelaxed { duration, max_duration } => {
                write!(f, "cue lasts {:.3}s (max {:.3}s)", duration, max_duration)
            }
            WarningKind::BelowMinimumDuration { duration, min_duration } => {
                write!(f, "cue lasts {:.3}s (floor {:.3}s)", duration, min_duration)
            }
            WarningKind::TranslationFallback { error } => {
                write!(f, "translation failed, source text kept: {}", error)
            }
        }
    }
}

/// A warning tied to the segment (and cue, once numbered) it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintWarning {
    /// Zero-based segment position
    pub segment_index: usize,

    /// One-based cue index; `None` for segment-level warnings
    pub cue_index: Option<usize>,

    /// What was relaxed
    pub kind: WarningKind,
}

impl fmt::Display for ConstraintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cue_index {
            Some(cue_index) => write!(
                f,
                "segment {} / cue {}: {}",
                self.segment_index + 1,
                cue_index,
                self.kind
            ),
            None => write!(f, "segment {}: {}", self.segment_index + 1, self.kind),
        }
    }
}

/// Result of a full engine run
#[derive(Debug, Clone, Default)]
pub struct SegmentationOutput {
    /// Validated, numbered cues
    pub cues: Vec<Cue>,

    /// Recoverable relaxations, in cue order
    pub warnings: Vec<ConstraintWarning>,

    /// Number of segments the tokens were grouped into
    pub segment_count: usize,
}

impl SegmentationOutput {
    /// Whether any single-word line overflowed the character cap
    pub fn has_soft_cap_violations(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w.kind, WarningKind::LineTooLong { .. }))
    }
}
