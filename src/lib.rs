/*!
 * # syncsub - timed subtitles from speech
 *
 * Turns a word-timed transcript (or a video, through ffmpeg and whisper) into
 * translated, readable SubRip subtitles.
 *
 * ## Pipeline
 *
 * 1. Tokens are grouped into sentence-like segments (`segmentation::grouping`).
 * 2. Each segment is translated exactly once on a bounded worker pool
 *    (`translation::batch`), with an abort or fallback policy for failures.
 * 3. Each translated segment is wrapped into lines, packed into cues and given
 *    a share of the segment's time span (`segmentation::splitting`).
 * 4. Cues are numbered globally and validated (`segmentation::assembly`).
 * 5. Cues are rendered as SRT (`subtitle_formatter`).
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `segmentation`: The constraint engine and its data model
 * - `translation`: Translator trait, batch worker pool and cache
 * - `providers`: HTTP clients for translation backends (`providers::ollama`)
 * - `transcriber` / `audio_extractor`: whisper and ffmpeg adapters
 * - `subtitle_formatter`: SRT rendering and parsing
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

pub mod app_config;
pub mod app_controller;
pub mod audio_extractor;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod segmentation;
pub mod subtitle_formatter;
pub mod transcriber;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{BatchSummary, Controller, RunOutcome};
pub use errors::{AppError, ProviderError, SegmentationError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use segmentation::{
    ConstraintWarning, Cue, Segment, SegmentationConfig, SegmentationEngine, SegmentationOutput, TimedToken,
    WarningKind,
};
pub use subtitle_formatter::SrtFormatter;
pub use translation::{BatchTranslator, FailurePolicy, Translator};
