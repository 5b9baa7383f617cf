/*!
 * Common test utilities for the lingofill test suite
 */

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use lingofill::app_config::{Config, ValidationMode};
use lingofill::providers::mock::MockProvider;
use lingofill::translation::{BatchTranslator, TranslationService};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    std::fs::write(&file_path, content)?;
    Ok(file_path)
}

/// One message for the catalog builder
pub enum TestMessage<'a> {
    /// Unfinished and empty: extracted by the pipeline
    Pending(&'a str),
    /// Already translated
    Finished(&'a str, &'a str),
    /// Marked unfinished but already carrying text: never reprocessed
    MarkedWithText(&'a str, &'a str),
}

/// Build a canonical single-context TS catalog
pub fn build_catalog(language: &str, messages: &[TestMessage<'_>]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n");
    out.push_str(&format!("<TS version=\"2.1\" language=\"{}\">\n", language));
    out.push_str("<context>\n    <name>MainWindow</name>\n");

    for message in messages {
        out.push_str("    <message>\n");
        match message {
            TestMessage::Pending(source) => {
                out.push_str(&format!("        <source>{}</source>\n", source));
                out.push_str("        <translation type=\"unfinished\"></translation>\n");
            }
            TestMessage::Finished(source, translation) => {
                out.push_str(&format!("        <source>{}</source>\n", source));
                out.push_str(&format!("        <translation>{}</translation>\n", translation));
            }
            TestMessage::MarkedWithText(source, translation) => {
                out.push_str(&format!("        <source>{}</source>\n", source));
                out.push_str(&format!(
                    "        <translation type=\"unfinished\">{}</translation>\n",
                    translation
                ));
            }
        }
        out.push_str("    </message>\n");
    }

    out.push_str("</context>\n</TS>\n");
    out
}

/// A test configuration targeting French with validation disabled
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.source_language = "en".to_string();
    config.target_language = "fr".to_string();
    config.batch.batch_delay_ms = 0;
    config.batch.batch_size = 20;
    config.validation.mode = ValidationMode::None;
    config
}

/// Build a batch translator backed by a scriptable mock.
///
/// The service handle is returned too so tests can reach the mock's call
/// counters through `service.mock()`.
pub fn mock_translator(
    config: Config,
    mock: MockProvider,
) -> (BatchTranslator, Arc<TranslationService>) {
    let service = Arc::new(TranslationService::with_mock(config.translation.clone(), mock));
    (BatchTranslator::new(service.clone(), config), service)
}
