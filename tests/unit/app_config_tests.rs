/*!
 * Tests for application configuration
 */

use autocaption::app_config::{Config, LogLevel, SubtitleStyle};
use autocaption::pipeline::PipelineConfig;
use log::LevelFilter;

use crate::common;

#[test]
fn test_defaultConfig_shouldUseBilingualChinese() {
    let config = Config::default();
    assert_eq!(config.source_language, "auto");
    assert_eq!(config.target_language, "zh");
    assert!(config.bilingual);
    assert_eq!(config.provider.base_url, "https://api.openai.com/v1");
    assert_eq!(config.provider.transcription_model, "whisper-1");
    assert!(config.style.hard_sub);
    assert_eq!(config.style.font_size, 24);
}

#[test]
fn test_serializeThenDeserialize_shouldBeEqual() {
    let mut config = Config::default();
    config.provider.api_key = "sk-abc".to_string();
    config.style.hard_sub = false;
    config.log_level = LogLevel::Debug;

    let json = serde_json::to_string_pretty(&config).unwrap();
    assert!(json.contains("\"log_level\": \"debug\""));
    let restored: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, config);
}

#[test]
fn test_emptyJson_shouldGiveDefaults() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json").unwrap();
    assert!(Config::load_or_create(&path).is_err());
}

#[test]
fn test_save_shouldRoundTripThroughFile() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    let config = Config {
        target_language: "fr".to_string(),
        bilingual: false,
        ..Config::default()
    };
    config.save(&path).unwrap();
    assert_eq!(Config::load_or_create(&path).unwrap(), config);
}

#[test]
fn test_validate_shouldAcceptSpecialLanguageValues() {
    let config = Config {
        source_language: "en".to_string(),
        target_language: "none".to_string(),
        ..Config::default()
    };
    assert!(config.validate().is_ok());
    assert!(!config.translation_enabled());
}

#[test]
fn test_validate_withBadStyle_shouldFail() {
    let config = Config {
        style: SubtitleStyle {
            outline_width: 50,
            ..SubtitleStyle::default()
        },
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_logLevel_shouldMapToFilter() {
    assert_eq!(LogLevel::Error.to_level_filter(), LevelFilter::Error);
    assert_eq!(LogLevel::default().to_level_filter(), LevelFilter::Info);
    assert_eq!(LogLevel::Trace.to_level_filter(), LevelFilter::Trace);
}

#[test]
fn test_pipelineConfig_fromConfig_shouldCarrySettings() {
    let mut config = Config::default();
    config.provider.translation_model = "gpt-4o".to_string();
    config.source_language = "ja".to_string();

    let pipeline = PipelineConfig::from(&config);
    assert_eq!(pipeline.translation_model, "gpt-4o");
    assert_eq!(pipeline.transcription_options().language.as_deref(), Some("ja"));
    assert!(pipeline.serialize_options().bilingual);
}
