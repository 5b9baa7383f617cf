/*!
 * Tests for configuration loading and validation
 */

use crate::common::{create_temp_dir, create_test_file};

use lingofill::app_config::{Config, TranslationProvider, ValidationMode};

#[test]
fn test_config_default_shouldValidate() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.validation.mode, ValidationMode::Language);
}

#[test]
fn test_config_defaultThresholds_shouldMatchDocumentedValues() {
    let config = Config::default();
    assert_eq!(config.batch.batch_size, 20);
    assert_eq!(config.batch.max_concurrent_batches_per_file, 1);
    assert_eq!(config.validation.quality.max_length_ratio, 10);
    assert_eq!(config.validation.quality.max_repeat_run, 20);
    assert!((config.validation.similarity_threshold - 0.35).abs() < f32::EPSILON);
}

#[test]
fn test_config_fromFile_partialJson_shouldFillDefaults() {
    let dir = create_temp_dir().unwrap();
    let json = r#"{
        "source_language": "en",
        "target_language": "de",
        "translation": {
            "provider": "ollama"
        },
        "batch": {
            "batch_size": 5
        }
    }"#;
    let path = create_test_file(&dir.path().to_path_buf(), "conf.json", json).unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.target_language, "de");
    assert_eq!(config.batch.batch_size, 5);
    // Unspecified fields fall back to defaults
    assert_eq!(config.batch.rate_limit_count, 45);
    assert_eq!(config.batch.rate_limit_window_ms, 60_000);
    assert_eq!(config.validation.quality.long_source_len, 50);
}

#[test]
fn test_config_fromFile_badLanguage_shouldError() {
    let dir = create_temp_dir().unwrap();
    let json = r#"{
        "source_language": "en",
        "target_language": "xx_not_a_language",
        "translation": { "provider": "ollama" }
    }"#;
    let path = create_test_file(&dir.path().to_path_buf(), "conf.json", json).unwrap();
    assert!(Config::from_file(&path).is_err());
}

#[test]
fn test_config_openaiWithoutApiKey_shouldFailValidation() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::OpenAI;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_zeroBatchSize_shouldFailValidation() {
    let mut config = Config::default();
    config.batch.batch_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_localeTargets_shouldValidate() {
    let mut config = Config::default();
    config.target_language = "zh_CN".to_string();
    assert!(config.validate().is_ok());

    config.target_language = "sr@latin".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_translationConfig_activeProviderLookup_shouldResolveSettings() {
    let config = Config::default();
    let provider_config = config.translation.get_active_provider_config().unwrap();
    assert_eq!(provider_config.provider_type, "ollama");
    assert!(!config.translation.get_model().is_empty());
    assert!(config.translation.get_endpoint().starts_with("http"));
}
