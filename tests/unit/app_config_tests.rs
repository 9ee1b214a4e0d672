/*!
 * Tests for app configuration functionality
 */

use anyhow::Result;
use syncsub::app_config::{Config, Device, LogLevel, TranslationProvider};
use syncsub::subtitle_formatter::OutputFormat;
use syncsub::translation::FailurePolicy;

use crate::common;

#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "ml");
    assert_eq!(config.device, Device::Cuda);
    assert_eq!(config.whisper_model, "medium.en");
    assert!(config.whisper_fp16);
    assert_eq!(config.output_format, OutputFormat::Srt);
    assert_eq!(config.max_chars_per_segment, 80);
    assert_eq!(config.max_duration_seconds, 7.0);
    assert_eq!(config.max_lines_per_block, 2);
    assert_eq!(config.segmentation.min_duration_seconds, 0.8);
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.translation.failure_policy, FailurePolicy::Fallback);
    assert_eq!(config.translation.concurrent_requests, 4);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_fromPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{ "target_language": "de", "max_lines_per_block": 1,
             "translation": { "provider": "none", "failure_policy": "abort" } }"#,
    )?;

    let config = Config::from_file(&path)?;

    assert_eq!(config.target_language, "de");
    assert_eq!(config.max_lines_per_block, 1);
    assert_eq!(config.translation.provider, TranslationProvider::None);
    assert_eq!(config.translation.failure_policy, FailurePolicy::Abort);
    assert_eq!(config.translation.retry_count, 3);
    assert_eq!(config.segmentation_config().max_lines_per_block, 1);
    Ok(())
}

#[test]
fn test_config_withUnknownOutputFormat_shouldFailToParse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", r#"{ "output_format": "vtt" }"#)?;
    assert!(Config::from_file(&path).is_err());
    Ok(())
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let (config, created) = Config::load_or_create(&path)?;
    assert!(created);
    assert!(path.exists());

    let (reloaded, created_again) = Config::load_or_create(&path)?;
    assert!(!created_again);
    assert_eq!(reloaded.target_language, config.target_language);
    Ok(())
}

#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let mut config = Config {
        temp_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    assert!(config.validate().is_ok());

    config.target_language = "zz-invalid".to_string();
    assert!(config.validate().is_err());
    config.target_language = "fr".to_string();

    config.temp_dir = temp_dir.path().join("missing");
    assert!(config.validate().is_err());
    config.temp_dir = temp_dir.path().to_path_buf();

    config.max_chars_per_segment = 0;
    assert!(config.validate().is_err());
    config.max_chars_per_segment = 42;

    config.segmentation.min_duration_seconds = 10.0;
    assert!(config.validate().is_err());
    config.segmentation.min_duration_seconds = 1.0;

    config.translation.concurrent_requests = 0;
    assert!(config.validate().is_err());
    config.translation.concurrent_requests = 1;

    config.translation_model = String::new();
    assert!(config.validate().is_err());
    config.translation.provider = TranslationProvider::None;
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_effectiveFp16_onCpu_shouldBeDisabled() {
    let config = Config {
        device: Device::Cpu,
        ..Config::default()
    };
    assert!(!config.effective_fp16());
    assert!(Config::default().effective_fp16());
}

#[test]
fn test_batchOptions_shouldMirrorTranslationConfig() {
    let mut config = Config::default();
    config.translation.concurrent_requests = 7;
    config.translation.retry_backoff_ms = 250;
    let options = config.translation.batch_options();
    assert_eq!(options.concurrent_requests, 7);
    assert_eq!(options.retry_backoff_ms, 250);
}

#[test]
fn test_config_ffmpegAndLogLimits_shouldDefaultAndValidate() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = Config {
        temp_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };

    assert_eq!(config.ffmpeg_timeout(), std::time::Duration::from_secs(30 * 60));
    assert_eq!(config.log_max_bytes, 10 * 1024 * 1024);
    assert_eq!(config.log_backup_count, 5);

    config.ffmpeg_timeout_secs = 0;
    assert!(config.validate().is_err());
    config.ffmpeg_timeout_secs = 120;

    config.log_file = Some(temp_dir.path().join("syncsub.log"));
    config.log_max_bytes = 0;
    assert!(config.validate().is_err());
    config.log_max_bytes = 1024;
    assert!(config.validate().is_ok());
    Ok(())
}
