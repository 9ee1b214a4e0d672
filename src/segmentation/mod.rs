/*!
 * Segmentation engine.
 *
 * Converts a timed token stream into subtitle cues:
 *
 * - `grouping`: tokens to sentence-level segments (the unit of translation)
 * - `wrapping`: balanced word-boundary line wrapping
 * - `splitting`: segment to cues under the character, line and duration caps
 * - `assembly`: global numbering and validation
 * - `engine`: the public entry points tying the steps together
 */

pub use self::config::SegmentationConfig;
pub use self::engine::SegmentationEngine;
pub use self::model::{
    ConstraintWarning, Cue, Segment, SegmentationOutput, TimedToken, WarningKind,
};
pub use self::splitting::{LocalWarning, SplitResult};

pub mod assembly;
pub mod config;
pub mod engine;
pub mod grouping;
pub mod model;
pub mod splitting;
pub mod wrapping;
