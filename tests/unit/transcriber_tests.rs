/*!
 * Tests for transcript loading
 */

use anyhow::Result;
use syncsub::errors::AppError;
use syncsub::transcriber::{load_transcript_file, parse_transcript_json};

use crate::common;

#[test]
fn test_parse_withWordAlias_shouldReadTokens() -> Result<()> {
    let json = r#"[{"word":" Hi","start":0.0,"end":0.3},{"word":"there.","start":0.3,"end":0.8}]"#;
    let tokens = parse_transcript_json(json)?;
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].text, "Hi");
    Ok(())
}

#[test]
fn test_parse_withOutOfOrderTokens_shouldKeepOrderForValidation() -> Result<()> {
    let json = r#"[{"text":"b","start":2.0,"end":2.5},{"text":"a","start":1.0,"end":1.5}]"#;
    let tokens = parse_transcript_json(json)?;
    assert_eq!(tokens[0].text, "b");
    assert_eq!(tokens[1].text, "a");
    Ok(())
}

#[test]
fn test_parse_withEmptyWhisperDocument_shouldYieldNoTokens() -> Result<()> {
    let tokens = parse_transcript_json(r#"{"text":"","segments":[],"language":"en"}"#)?;
    assert!(tokens.is_empty());
    Ok(())
}

#[test]
fn test_load_withMissingFile_shouldReturnFileError() {
    let result = load_transcript_file("/definitely/not/here.json");
    assert!(matches!(result, Err(AppError::File(_))));
}

#[test]
fn test_load_withFile_shouldParseContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "talk.json",
        r#"[{"text":"Hello","start":0.0,"end":0.5},{"text":"world.","start":0.5,"end":1.0}]"#,
    )?;
    let tokens = load_transcript_file(&path)?;
    assert_eq!(tokens.len(), 2);
    Ok(())
}
