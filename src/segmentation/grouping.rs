/*!
 * Sentence/segment grouping.
 *
 * Turns the flat token stream into translatable segments. A segment closes
 * after a token ending a sentence, before a pause longer than the configured
 * threshold, or before a token that would stretch the span past the ceiling.
 */

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SegmentationError;

use super::config::SegmentationConfig;
use super::model::{Segment, TimedToken};

// Sentence terminator, optionally followed by closing quotes or brackets
static SENTENCE_END_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.?!]["'”’)\]]*$"#).unwrap());

/// Check the token stream contract before any processing happens
pub fn validate_tokens(tokens: &[TimedToken]) -> Result<(), SegmentationError> {
    let malformed = |token_index: usize, reason: String| SegmentationError::MalformedInput {
        token_index,
        reason,
    };

    for (idx, token) in tokens.iter().enumerate() {
        if token.text.trim().is_empty() {
            return Err(malformed(idx, "token text is empty".to_string()));
        }
        if !token.start.is_finite() || !token.end.is_finite() {
            return Err(malformed(
                idx,
                format!("non-finite interval [{}, {})", token.start, token.end),
            ));
        }
        if token.start < 0.0 {
            return Err(malformed(idx, format!("negative start time {}", token.start)));
        }
        if token.end <= token.start {
            return Err(malformed(
                idx,
                format!("end {} is not after start {}", token.end, token.start),
            ));
        }
        if idx > 0 && token.start < tokens[idx - 1].start {
            return Err(malformed(
                idx,
                format!(
                    "start {} precedes previous token start {}",
                    token.start,
                    tokens[idx - 1].start
                ),
            ));
        }
    }

    Ok(())
}

/// Whether the token closes a sentence
pub fn ends_sentence(text: &str) -> bool {
    SENTENCE_END_REGEX.is_match(text.trim_end())
}

/// Join token texts with single spaces, gluing punctuation and contractions to the previous word
pub fn join_token_texts(tokens: &[TimedToken]) -> String {
    let mut text = String::new();
    for token in tokens {
        let piece = token.text.trim();
        if piece.is_empty() {
            continue;
        }
        if !text.is_empty() && !attaches_to_previous(piece) {
            text.push(' ');
        }
        text.push_str(piece);
    }
    text
}

fn attaches_to_previous(piece: &str) -> bool {
    piece.starts_with([',', '.', ';', ':', '!', '?', '%', ')', ']', '}', '\'', '’'])
}

fn build_segment(tokens: Vec<TimedToken>) -> Segment {
    let start = tokens[0].start;
    let end = tokens
        .iter()
        .map(|t| t.end)
        .fold(f64::NEG_INFINITY, f64::max);
    let source_text = join_token_texts(&tokens);

    Segment {
        tokens,
        start,
        end,
        source_text,
        translated_text: None,
    }
}

/// Group a validated token stream into ordered, non-overlapping segments
pub fn group_tokens(
    tokens: &[TimedToken],
    config: &SegmentationConfig,
) -> Result<Vec<Segment>, SegmentationError> {
    validate_tokens(tokens)?;

    let mut segments = Vec::new();
    let mut current: Vec<TimedToken> = Vec::new();
    let mut current_end = f64::NEG_INFINITY;

    for (idx, token) in tokens.iter().enumerate() {
        current.push(token.clone());
        current_end = current_end.max(token.end);

        let Some(next) = tokens.get(idx + 1) else {
            break;
        };

        // Segment starts must strictly increase, so no boundary between equal starts
        let segment_start = current[0].start;
        if next.start <= segment_start {
            continue;
        }

        let sentence_closed = ends_sentence(&token.text);
        let paused = next.start - token.end > config.pause_threshold_seconds;
        let over_ceiling =
            current_end.max(next.end) - segment_start > config.max_segment_span_seconds;

        if sentence_closed || paused || over_ceiling {
            trace!(
                "Closing segment at token {} (sentence: {}, pause: {}, ceiling: {})",
                idx, sentence_closed, paused, over_ceiling
            );
            segments.push(build_segment(std::mem::take(&mut current)));
            current_end = f64::NEG_INFINITY;
        }
    }

    if !current.is_empty() {
        segments.push(build_segment(current));
    }

    // Overlapping token intervals across a boundary: the earlier segment yields
    for idx in 1..segments.len() {
        let next_start = segments[idx].start;
        let previous = &mut segments[idx - 1];
        if previous.end > next_start {
            debug!(
                "Clipping segment {} end from {:.3}s to {:.3}s",
                idx - 1,
                previous.end,
                next_start
            );
            previous.end = next_start;
        }
    }

    debug!("Grouped {} tokens into {} segments", tokens.len(), segments.len());
    Ok(segments)
}
