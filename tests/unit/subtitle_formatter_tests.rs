/*!
 * Tests for SRT output
 */

use anyhow::Result;
use syncsub::segmentation::Cue;
use syncsub::subtitle_formatter::{SrtFormatter, format_timestamp};

use crate::common;

fn sample_cues() -> Vec<Cue> {
    vec![
        Cue {
            index: 1,
            start: 0.0,
            end: 1.0,
            lines: vec!["Hello world.".to_string()],
        },
        Cue {
            index: 2,
            start: 61.25,
            end: 3725.5,
            lines: vec!["Two".to_string(), "lines".to_string()],
        },
    ]
}

#[test]
fn test_render_withTwoCues_shouldProduceSrtBlocks() {
    let rendered = SrtFormatter::render(&sample_cues());
    let expected = "1\n00:00:00,000 --> 00:00:01,000\nHello world.\n\n\
                    2\n00:01:01,250 --> 01:02:05,500\nTwo\nlines\n\n";
    assert_eq!(rendered, expected);
}

#[test]
fn test_render_withNoCues_shouldBeEmpty() {
    assert_eq!(SrtFormatter::render(&[]), "");
}

#[test]
fn test_formatTimestamp_withLargeHours_shouldNotWrap() {
    assert_eq!(format_timestamp(100.0 * 3600.0 + 0.5), "100:00:00,500");
}

#[test]
fn test_parse_withRenderedOutput_shouldRecoverCues() -> Result<()> {
    let cues = sample_cues();
    let parsed = SrtFormatter::parse(&SrtFormatter::render(&cues))?;
    assert_eq!(parsed, cues);
    Ok(())
}

#[test]
fn test_parse_withCrlfAndDotSeparator_shouldBeAccepted() -> Result<()> {
    let content = "1\r\n00:00:01.000 --> 00:00:02.500\r\nHi\r\n\r\n";
    let parsed = SrtFormatter::parse(content)?;
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].end, 2.5);
    Ok(())
}

#[test]
fn test_parse_withBadTimingLine_shouldFail() {
    assert!(SrtFormatter::parse("1\n00:00:01 -> 00:00:02\nHi\n").is_err());
}

#[test]
fn test_writeToFile_shouldCreateParentDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("movie.ml.srt");

    SrtFormatter::write_to_file(&sample_cues(), &path)?;

    let content = std::fs::read_to_string(&path)?;
    assert!(content.starts_with("1\n00:00:00,000 --> 00:00:01,000\n"));
    assert!(content.ends_with("lines\n\n"));
    Ok(())
}

#[test]
fn test_render_withSubMillisecondCue_shouldKeepRangesOrderedAndNonEmpty() -> Result<()> {
    let cues = vec![
        Cue {
            index: 1,
            start: 5.0,
            end: 5.0004,
            lines: vec!["Hi.".to_string()],
        },
        Cue {
            index: 2,
            start: 5.0004,
            end: 6.0,
            lines: vec!["There.".to_string()],
        },
    ];

    let rendered = SrtFormatter::render(&cues);

    assert!(rendered.contains("1\n00:00:05,000 --> 00:00:05,001\nHi.\n"));
    assert!(rendered.contains("2\n00:00:05,001 --> 00:00:06,000\nThere.\n"));
    let parsed = SrtFormatter::parse(&rendered)?;
    assert!(parsed.iter().all(|cue| cue.start < cue.end));
    assert!(parsed[0].end <= parsed[1].start);
    Ok(())
}

#[test]
fn test_render_withSubMillisecondToken_shouldNotCollapseTheCue() -> Result<()> {
    let engine = syncsub::segmentation::SegmentationEngine::new(Default::default())?;
    let tokens = vec![common::tok("Hi.", 5.0, 5.0004)];

    let output = engine.process_untranslated(&tokens)?;

    assert_eq!(
        SrtFormatter::render(&output.cues),
        "1\n00:00:05,000 --> 00:00:05,001\nHi.\n\n"
    );
    Ok(())
}
