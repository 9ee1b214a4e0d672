/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::path::Path;
use syncsub::file_utils::{FileManager, FileType, RotatingLogFile};

use crate::common;

#[test]
fn test_generateOutputPath_shouldAppendLanguageAndExtension() {
    let path = FileManager::generate_output_path("/videos/movie.mkv", "/out", "ml", "srt");
    assert_eq!(path, Path::new("/out/movie.ml.srt"));

    let path = FileManager::generate_output_path("talk.words.json", "subs", "en", "srt");
    assert_eq!(path, Path::new("subs/talk.words.en.srt"));
}

#[test]
fn test_detectFileType_byExtension() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "clip.MP4", "not really a video")?;
    let transcript = common::create_test_file(temp_dir.path(), "clip.json", "[]")?;
    let other = common::create_test_file(temp_dir.path(), "notes.txt", "hello")?;

    assert_eq!(FileManager::detect_file_type(&video)?, FileType::Video);
    assert_eq!(FileManager::detect_file_type(&transcript)?, FileType::Transcript);
    assert_eq!(FileManager::detect_file_type(&other)?, FileType::Unknown);
    assert!(FileManager::detect_file_type(temp_dir.path().join("missing.mkv")).is_err());
    Ok(())
}

#[test]
fn test_findInputs_shouldSortBySizeAndSkipOthers() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "big.mkv", &"x".repeat(300))?;
    common::create_test_file(temp_dir.path(), "small.json", "[]")?;
    common::create_test_file(temp_dir.path(), "medium.mp4", &"x".repeat(100))?;
    common::create_test_file(temp_dir.path(), "readme.txt", "ignored")?;
    std::fs::create_dir(temp_dir.path().join("nested.mkv"))?;

    let inputs = FileManager::find_inputs_sorted_by_size(temp_dir.path())?;
    let names: Vec<String> = inputs
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["small.json", "medium.mp4", "big.mkv"]);
    Ok(())
}

#[test]
fn test_ensureWritableDir_withMissingDir_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert!(FileManager::ensure_writable_dir(temp_dir.path()).is_ok());
    assert!(FileManager::ensure_writable_dir(temp_dir.path().join("nope")).is_err());
    Ok(())
}

#[test]
fn test_ensureDir_withFilePath_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "file.txt", "x")?;
    assert!(FileManager::ensure_dir(&file).is_err());

    let nested = temp_dir.path().join("a").join("b");
    FileManager::ensure_dir(&nested)?;
    assert!(FileManager::dir_exists(&nested));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_findInputs_withDanglingLink_shouldSkipItAndKeepScanning() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let real = common::create_test_file(temp_dir.path(), "real.json", "[]")?;
    std::os::unix::fs::symlink(temp_dir.path().join("gone.mkv"), temp_dir.path().join("dangling.mkv"))?;

    let inputs = FileManager::find_inputs_sorted_by_size(temp_dir.path())?;

    assert_eq!(inputs, vec![real]);
    Ok(())
}

#[test]
fn test_rotatingLogFile_shouldAppendTimestampedLines() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log = temp_dir.path().join("logs").join("syncsub.log");
    let mut log_file = RotatingLogFile::new(&log, 1024 * 1024, 2);

    log_file.append("first")?;
    log_file.append("second")?;

    let content = FileManager::read_to_string(&log)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
    assert!(lines[1].ends_with("second"));
    Ok(())
}

#[test]
fn test_rotatingLogFile_withSmallLimit_shouldKeepBoundedBackups() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log = temp_dir.path().join("syncsub.log");
    // Every line is over half the limit, so each append after the first rotates
    let mut log_file = RotatingLogFile::new(&log, 60, 2);

    for n in 1..=5 {
        log_file.append(&format!("line {} {}", n, "x".repeat(20)))?;
    }

    assert!(FileManager::read_to_string(&log)?.contains("line 5"));
    assert!(FileManager::read_to_string(log_file.backup_path(1))?.contains("line 4"));
    assert!(FileManager::read_to_string(log_file.backup_path(2))?.contains("line 3"));
    assert!(!log_file.backup_path(3).exists());
    assert!(std::fs::metadata(&log)?.len() <= 60);
    Ok(())
}

#[test]
fn test_rotatingLogFile_withExistingFile_shouldCountItsSize() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log = common::create_test_file(temp_dir.path(), "syncsub.log", &"y".repeat(50))?;
    let mut log_file = RotatingLogFile::new(&log, 60, 1);

    log_file.append("fresh start")?;

    assert_eq!(FileManager::read_to_string(log_file.backup_path(1))?, "y".repeat(50));
    assert!(FileManager::read_to_string(&log)?.ends_with("] fresh start\n"));
    Ok(())
}
