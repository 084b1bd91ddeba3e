/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use csub::app_config::{Config, DeltaConfig, LogLevel};
use csub::errors::{self, ShiftError};
use csub::timecode::{NegativeTimePolicy, TimeDelta};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.delta, DeltaConfig::default());
    assert_eq!(config.negative_time, NegativeTimePolicy::Keep);
    assert_eq!(config.log_level, LogLevel::Warn);
    assert!(config.validate().is_ok());
    assert!(config.time_delta().unwrap().is_zero());
}

/// Test parsing a partial JSON config
#[test]
fn test_config_fromJson_withPartialFields_shouldFillDefaults() -> Result<()> {
    let config: Config = serde_json::from_str(
        r#"{ "delta": { "s": -3, "count": 1 }, "negative_time": "clamp" }"#,
    )?;

    assert_eq!(config.delta.s, -3);
    assert_eq!(config.delta.count, 1);
    assert_eq!(config.delta.ms, 0);
    assert_eq!(config.negative_time, NegativeTimePolicy::Clamp);
    assert_eq!(config.log_level, LogLevel::Warn);
    assert_eq!(config.time_delta()?, TimeDelta::new(0, -3, 0, 0, 1)?);
    Ok(())
}

/// Test configuration validation of the millisecond range
#[test]
fn test_config_validation_withMillisecondsOutOfRange_shouldFail() {
    let mut config = Config::default();
    config.delta.ms = 999;
    assert!(config.validate().is_ok());

    config.delta.ms = -1000;
    match config.validate() {
        Err(ShiftError::DeltaOutOfRange { value }) => assert_eq!(value, -1000),
        other => panic!("expected DeltaOutOfRange, got {:?}", other),
    }
    assert!(config.time_delta().is_err());
}

/// Test loading a config file from disk
#[test]
fn test_config_from_file_withValidFile_shouldLoad() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "csub.json",
        r#"{ "delta": { "ms": 250 }, "log_level": "debug", "negative_time": "reject" }"#,
    )?;

    let config = Config::load(Some(&path))?;
    assert_eq!(config.delta.ms, 250);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.negative_time, NegativeTimePolicy::Reject);
    assert_eq!(config.log_level.to_level_filter(), log::LevelFilter::Debug);
    Ok(())
}

/// Test that broken or missing config files are configuration errors
#[test]
fn test_config_from_file_withBadFile_shouldBeConfigError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let missing = temp_dir.path().join("missing.json");
    let err = Config::from_file(&missing).unwrap_err();
    assert_eq!(errors::exit_code_for(&err), 2);

    let broken = common::create_test_file(temp_dir.path(), "broken.json", "{ not json")?;
    let err = Config::from_file(&broken).unwrap_err();
    assert_eq!(errors::exit_code_for(&err), 2);
    Ok(())
}

/// Test that the config round-trips through JSON
#[test]
fn test_config_serialize_shouldUseLowercaseEnums() -> Result<()> {
    let mut config = Config::default();
    config.negative_time = NegativeTimePolicy::Clamp;
    config.log_level = LogLevel::Trace;

    let json = serde_json::to_string(&config)?;
    assert!(json.contains("\"clamp\""));
    assert!(json.contains("\"trace\""));

    let back: Config = serde_json::from_str(&json)?;
    assert_eq!(back, config);
    Ok(())
}
