/*!
 * Invariants checked over generated transcripts and several constraint sets
 */

use anyhow::Result;
use syncsub::providers::mock::{MockProvider, MockRequest};
use syncsub::segmentation::wrapping::char_len;
use syncsub::segmentation::{SegmentationConfig, SegmentationEngine, SegmentationOutput, WarningKind};
use syncsub::subtitle_formatter::SrtFormatter;
use syncsub::translation::FailurePolicy;

use crate::common::{fast_options, generated_transcript, mock_translator, narrow_config};

const EPS: f64 = 1e-6;

fn configs() -> Vec<SegmentationConfig> {
    vec![
        SegmentationConfig::default(),
        narrow_config(20, 1),
        narrow_config(32, 2),
        SegmentationConfig {
            max_chars_per_segment: 42,
            max_lines_per_block: 2,
            max_duration_seconds: 3.0,
            min_duration_seconds: 1.0,
            ..Default::default()
        },
    ]
}

fn has_warning(output: &SegmentationOutput, cue_index: usize, check: impl Fn(&WarningKind) -> bool) -> bool {
    output
        .warnings
        .iter()
        .any(|w| w.cue_index == Some(cue_index) && check(&w.kind))
}

fn assert_cue_invariants(output: &SegmentationOutput, config: &SegmentationConfig) {
    for (pos, cue) in output.cues.iter().enumerate() {
        assert_eq!(cue.index, pos + 1, "indices must be contiguous from 1");
        assert!(cue.start < cue.end, "cue {} has an empty range", cue.index);
        if pos > 0 {
            assert!(output.cues[pos - 1].end <= cue.start, "cue {} overlaps its predecessor", cue.index);
        }

        for line in &cue.lines {
            if char_len(line) > config.max_chars_per_segment {
                assert!(!line.contains(' '), "multi-word line over the cap: '{}'", line);
                assert!(has_warning(output, cue.index, |k| matches!(k, WarningKind::LineTooLong { .. })));
            }
        }

        if cue.lines.len() > config.max_lines_per_block {
            assert!(has_warning(output, cue.index, |k| matches!(k, WarningKind::LineCapRelaxed { .. })));
        }
        if cue.duration() > config.max_duration_seconds + EPS {
            assert!(has_warning(output, cue.index, |k| matches!(k, WarningKind::DurationCapRelaxed { .. })));
        }
        if cue.duration() < config.min_duration_seconds - EPS {
            assert!(has_warning(output, cue.index, |k| matches!(k, WarningKind::BelowMinimumDuration { .. })));
        }
    }
}

#[test]
fn test_generatedTranscripts_shouldSatisfyCueInvariants() -> Result<()> {
    crate::common::init_test_logging();
    for config in configs() {
        let engine = SegmentationEngine::new(config.clone())?;
        for seed in 0..8 {
            let tokens = generated_transcript(seed, 250);
            let output = engine.process_untranslated(&tokens)?;
            assert!(!output.cues.is_empty());
            assert_cue_invariants(&output, &config);
        }
    }
    Ok(())
}

#[test]
fn test_generatedTranscripts_shouldNeverDropWords() -> Result<()> {
    let engine = SegmentationEngine::new(narrow_config(24, 2))?;
    let tokens = generated_transcript(42, 300);
    let output = engine.process_untranslated(&tokens)?;

    let source_words: Vec<String> = tokens.iter().map(|t| t.text.clone()).collect();
    let cue_words: Vec<String> = output
        .cues
        .iter()
        .flat_map(|c| c.lines.iter())
        .flat_map(|l| l.split_whitespace().map(str::to_string))
        .collect();
    assert_eq!(cue_words, source_words);
    Ok(())
}

#[test]
fn test_allocatedSpans_shouldReconstructEverySegmentSpan() -> Result<()> {
    for config in configs() {
        let engine = SegmentationEngine::new(config)?;
        let segments = engine.group(&generated_transcript(7, 250))?;
        for segment in &segments {
            let spans = engine.split(segment).allocated_spans;
            assert_eq!(spans[0].0, segment.start);
            assert_eq!(spans[spans.len() - 1].1, segment.end);
            for pair in spans.windows(2) {
                assert_eq!(pair[0].1, pair[1].0, "gap or overlap inside a segment");
            }
        }
    }
    Ok(())
}

#[test]
fn test_cuesOfOneSegment_shouldStayInsideItsSpan() -> Result<()> {
    let engine = SegmentationEngine::new(narrow_config(20, 1))?;
    let segments = engine.group(&generated_transcript(3, 200))?;
    for segment in &segments {
        let cues = engine.split(segment).cues;
        assert_eq!(cues[0].start, segment.start);
        assert_eq!(cues[cues.len() - 1].end, segment.end);
    }
    Ok(())
}

#[tokio::test]
async fn test_rerun_withSameInputAndResponses_shouldBeByteIdentical() -> Result<()> {
    fn reverse(request: &MockRequest) -> String {
        request.text.split_whitespace().rev().collect::<Vec<_>>().join(" ")
    }

    let engine = SegmentationEngine::new(narrow_config(30, 2))?;
    let tokens = generated_transcript(11, 200);

    let mut rendered = Vec::new();
    for _ in 0..2 {
        let translator = mock_translator(
            MockProvider::slow(1).with_custom_response(reverse),
            fast_options(FailurePolicy::Abort, 8, 0),
        );
        let output = engine.process(&tokens, &translator).await?;
        assert_cue_invariants(&output, engine.config());
        rendered.push(SrtFormatter::render(&output.cues));
    }

    assert_eq!(rendered[0], rendered[1]);
    Ok(())
}
