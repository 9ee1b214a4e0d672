/*!
 * Global assembly: concatenates per-segment cues, assigns one-based indices,
 * attaches warnings to their final cue numbers, and validates the result.
 */

use log::debug;

use crate::errors::SegmentationError;

use super::model::{ConstraintWarning, Cue, SegmentationOutput};
use super::splitting::SplitResult;

/// Number cues across all segments and check the output invariants
pub fn assemble(
    splits: Vec<SplitResult>,
    segment_warnings: Vec<ConstraintWarning>,
) -> Result<SegmentationOutput, SegmentationError> {
    let segment_count = splits.len();
    let mut cues: Vec<Cue> = Vec::new();
    let mut warnings = segment_warnings;

    for (segment_index, split) in splits.into_iter().enumerate() {
        let base = cues.len();
        for warning in split.warnings {
            warnings.push(ConstraintWarning {
                segment_index,
                cue_index: Some(base + warning.cue_offset + 1),
                kind: warning.kind,
            });
        }
        for mut cue in split.cues {
            cue.index = cues.len() + 1;
            cues.push(cue);
        }
    }

    // Segment-level warnings first within a segment, then by cue
    warnings.sort_by_key(|w| (w.segment_index, w.cue_index));

    validate_cues(&cues)?;

    debug!(
        "Assembled {} cues from {} segments ({} warnings)",
        cues.len(),
        segment_count,
        warnings.len()
    );

    Ok(SegmentationOutput {
        cues,
        warnings,
        segment_count,
    })
}

/// Check ordering, timing and numbering of a finished cue list
pub fn validate_cues(cues: &[Cue]) -> Result<(), SegmentationError> {
    let violation = |cue_index: usize, reason: String| SegmentationError::InvariantViolation {
        cue_index,
        reason,
    };

    for (pos, cue) in cues.iter().enumerate() {
        if cue.index != pos + 1 {
            return Err(violation(
                cue.index,
                format!("expected index {}", pos + 1),
            ));
        }
        if !cue.start.is_finite() || !cue.end.is_finite() || cue.start < 0.0 {
            return Err(violation(
                cue.index,
                format!("invalid time range [{}, {})", cue.start, cue.end),
            ));
        }
        if cue.start >= cue.end {
            return Err(violation(
                cue.index,
                format!("start {} is not before end {}", cue.start, cue.end),
            ));
        }
        if cue.lines.iter().all(|line| line.trim().is_empty()) {
            return Err(violation(cue.index, "cue has no text".to_string()));
        }
        if pos > 0 && cues[pos - 1].end > cue.start {
            return Err(violation(
                cue.index,
                format!(
                    "overlaps previous cue ending at {}",
                    cues[pos - 1].end
                ),
            ));
        }
    }

    Ok(())
}
