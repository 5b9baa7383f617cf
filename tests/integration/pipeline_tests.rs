/*!
 * End-to-end pipeline tests: extraction, dispatch, realignment, validation,
 * and incremental persistence over real catalog files.
 */

use crate::common::{build_catalog, create_temp_dir, create_test_file, mock_translator, test_config, TestMessage};

use lingofill::app_config::ValidationMode;
use lingofill::catalog::parser::{parse_file, parse_str};
use lingofill::providers::mock::MockProvider;

/// Scenario A: three units, three correctly ordered responses with matching
/// echoed sources; all three are accepted
#[tokio::test]
async fn test_pipeline_cleanBatch_shouldAcceptAllUnits() {
    let content = build_catalog(
        "fr_FR",
        &[
            TestMessage::Pending("Open File"),
            TestMessage::Pending("Close"),
            TestMessage::Pending("Quit"),
        ],
    );
    let mut doc = parse_str(&content).unwrap();

    let script = vec![MockProvider::json_response(&[
        ("Open File", "Ouvrir un fichier"),
        ("Close", "Fermer"),
        ("Quit", "Quitter"),
    ])];
    let (translator, _service) = mock_translator(test_config(), MockProvider::scripted(script));

    let (report, _stats) = translator.translate_document(&mut doc).await;

    assert_eq!(report.pending_before, 3);
    assert_eq!(report.accepted, 3);
    assert_eq!(report.unmapped, 0);
    assert_eq!(doc.pending_count(), 0);

    let written = doc.to_ts_string();
    assert!(written.contains("<translation>Ouvrir un fichier</translation>"));
    assert!(written.contains("<translation>Quitter</translation>"));
}

/// Scenario B: the backend omits one of three entries; two are accepted,
/// one stays pending, and nothing panics
#[tokio::test]
async fn test_pipeline_omittedEntry_shouldLeaveItPending() {
    let content = build_catalog(
        "fr_FR",
        &[
            TestMessage::Pending("Open File"),
            TestMessage::Pending("Close"),
            TestMessage::Pending("Quit"),
        ],
    );
    let mut doc = parse_str(&content).unwrap();

    let script = vec![MockProvider::json_response(&[
        ("Open File", "Ouvrir un fichier"),
        ("Quit", "Quitter"),
    ])];
    let (translator, _service) = mock_translator(test_config(), MockProvider::scripted(script));

    let (report, _stats) = translator.translate_document(&mut doc).await;

    assert_eq!(report.accepted, 2);
    assert_eq!(report.unmapped, 1);
    assert_eq!(doc.pending_count(), 1);

    // The omitted unit keeps its pending slot
    let written = doc.to_ts_string();
    assert!(written.contains("<source>Close</source>"));
    assert!(written.contains("<translation type=\"unfinished\"></translation>"));
}

/// Scenario C: echoed sources swapped at positions 0 and 1; the reconciler
/// remaps by content and both land correctly
#[tokio::test]
async fn test_pipeline_swappedResponses_shouldRemapByContent() {
    let content = build_catalog(
        "fr_FR",
        &[
            TestMessage::Pending("Delete"),
            TestMessage::Pending("Save"),
        ],
    );
    let mut doc = parse_str(&content).unwrap();

    let script = vec![MockProvider::json_response(&[
        ("Save", "Enregistrer"),
        ("Delete", "Supprimer"),
    ])];
    let (translator, _service) = mock_translator(test_config(), MockProvider::scripted(script));

    let (report, _stats) = translator.translate_document(&mut doc).await;
    assert_eq!(report.accepted, 2);

    let written = doc.to_ts_string();
    // Each translation ends up under its own source, not swapped
    let delete_pos = written.find("<source>Delete</source>").unwrap();
    let supprimer_pos = written.find("<translation>Supprimer</translation>").unwrap();
    let save_pos = written.find("<source>Save</source>").unwrap();
    assert!(delete_pos < supprimer_pos && supprimer_pos < save_pos);
}

/// Scenario C, ambiguous variant: duplicated source texts make the remap
/// unprovable and both units stay pending
#[tokio::test]
async fn test_pipeline_duplicateSourcesWithMismatch_shouldFailClosed() {
    let content = build_catalog(
        "fr_FR",
        &[
            TestMessage::Pending("OK"),
            TestMessage::Pending("OK"),
            TestMessage::Pending("Cancel"),
        ],
    );
    let mut doc = parse_str(&content).unwrap();

    // Mismatched first echo forces content remap; "OK" is then ambiguous
    let script = vec![MockProvider::json_response(&[
        ("Cancel", "Annuler"),
        ("OK", "Bien"),
        ("OK", "D'accord"),
    ])];
    let (translator, _service) = mock_translator(test_config(), MockProvider::scripted(script));

    let (report, _stats) = translator.translate_document(&mut doc).await;

    assert_eq!(report.accepted, 1);
    assert_eq!(report.unmapped, 2);
    assert_eq!(doc.pending_count(), 2);
}

/// Scenario D: the provider dies after batch 1; reopening the file shows
/// batch 1 persisted and batch 2 still pending
#[tokio::test]
async fn test_pipeline_interruptionAfterFirstBatch_shouldPersistPartialProgress() {
    let dir = create_temp_dir().unwrap();
    let content = build_catalog(
        "fr_FR",
        &[
            TestMessage::Pending("Open File"),
            TestMessage::Pending("Close"),
            TestMessage::Pending("Print"),
            TestMessage::Pending("Help"),
        ],
    );
    let path = create_test_file(&dir.path().to_path_buf(), "app_fr.ts", &content).unwrap();

    let mut config = test_config();
    config.batch.batch_size = 2;

    // Only batch 1 is scripted; batch 2 hits an exhausted (failing) backend
    let script = vec![MockProvider::json_response(&[
        ("Open File", "Ouvrir un fichier"),
        ("Close", "Fermer"),
    ])];
    let (translator, _service) = mock_translator(config, MockProvider::scripted(script));

    let (report, _stats) = translator.translate_file(&path).await;
    assert_eq!(report.accepted, 2);
    assert_eq!(report.failed_batches, 1);

    // Reopen from disk: batch 1 retained, batch 2 untouched
    let reopened = parse_file(&path).unwrap();
    assert_eq!(reopened.pending_count(), 2);
    let written = reopened.to_ts_string();
    assert!(written.contains("<translation>Ouvrir un fichier</translation>"));
    assert!(written.contains("<source>Print</source>"));
    assert!(written.contains("<translation type=\"unfinished\"></translation>"));
}

/// Idempotence: a fully translated file produces zero mutations and zero
/// backend calls
#[tokio::test]
async fn test_pipeline_fullyTranslatedFile_shouldDoNothing() {
    let content = build_catalog(
        "fr_FR",
        &[
            TestMessage::Finished("Open File", "Ouvrir un fichier"),
            TestMessage::Finished("Close", "Fermer"),
        ],
    );
    let mut doc = parse_str(&content).unwrap();

    let (translator, service) = mock_translator(test_config(), MockProvider::echo());
    let (report, _stats) = translator.translate_document(&mut doc).await;

    assert_eq!(report.pending_before, 0);
    assert_eq!(report.accepted, 0);
    assert_eq!(service.mock().unwrap().calls(), 0);
    assert_eq!(doc.to_ts_string(), content);
}

/// A network failure isolates the batch: units stay pending, no partial data
#[tokio::test]
async fn test_pipeline_backendTimeout_shouldKeepUnitsPending() {
    let content = build_catalog("fr_FR", &[TestMessage::Pending("Open File")]);
    let mut doc = parse_str(&content).unwrap();

    let (translator, _service) = mock_translator(test_config(), MockProvider::timed_out());
    let (report, _stats) = translator.translate_document(&mut doc).await;

    assert_eq!(report.failed_batches, 1);
    assert_eq!(report.accepted, 0);
    assert_eq!(doc.pending_count(), 1);
    assert_eq!(doc.to_ts_string(), content);
}

/// An unrecoverable payload yields zero results for the batch, same as no
/// response at all
#[tokio::test]
async fn test_pipeline_garbagePayload_shouldFailBatchCleanly() {
    let content = build_catalog("fr_FR", &[TestMessage::Pending("Open File")]);
    let mut doc = parse_str(&content).unwrap();

    let script = vec!["I'm sorry, I cannot translate this.".to_string()];
    let (translator, _service) = mock_translator(test_config(), MockProvider::scripted(script));

    let (report, _stats) = translator.translate_document(&mut doc).await;
    assert_eq!(report.failed_batches, 1);
    assert_eq!(doc.pending_count(), 1);
}

/// Markdown-fenced responses are repaired and still accepted
#[tokio::test]
async fn test_pipeline_fencedResponse_shouldBeRepairedAndAccepted() {
    let content = build_catalog("fr_FR", &[TestMessage::Pending("Open File")]);
    let mut doc = parse_str(&content).unwrap();

    let script = vec![format!(
        "Here you go:\n```json\n{}\n```",
        MockProvider::json_response(&[("Open File", "Ouvrir un fichier")])
    )];
    let (translator, _service) = mock_translator(test_config(), MockProvider::scripted(script));

    let (report, _stats) = translator.translate_document(&mut doc).await;
    assert_eq!(report.accepted, 1);
}

/// The quality gate rejects degenerate output and the unit stays pending
#[tokio::test]
async fn test_pipeline_garbageTranslation_shouldBeRejectedByQualityGate() {
    let content = build_catalog("fr_FR", &[TestMessage::Pending("Open File")]);
    let mut doc = parse_str(&content).unwrap();

    let script = vec![MockProvider::json_response(&[("Open File", "???")])];
    let (translator, _service) = mock_translator(test_config(), MockProvider::scripted(script));

    let (report, _stats) = translator.translate_document(&mut doc).await;
    assert_eq!(report.rejected_quality, 1);
    assert_eq!(report.accepted, 0);
    assert_eq!(doc.pending_count(), 1);
}

/// Language mode: rule-detectable wrong-script output is rejected without
/// any AI fallback call
#[tokio::test]
async fn test_pipeline_languageGate_shouldRejectWrongScript() {
    let content = build_catalog("ru_RU", &[TestMessage::Pending("Open the file")]);
    let mut doc = parse_str(&content).unwrap();

    let mut config = test_config();
    config.target_language = "ru_RU".to_string();
    config.validation.mode = ValidationMode::Language;

    // The "translation" is still English; the Cyrillic check fails it
    let script = vec![MockProvider::json_response(&[
        ("Open the file", "Open the file again"),
    ])];
    let (translator, service) = mock_translator(config, MockProvider::scripted(script));

    let (report, _stats) = translator.translate_document(&mut doc).await;
    assert_eq!(report.rejected_language, 1);
    assert_eq!(doc.pending_count(), 1);
    // Rule-based rejection; the script holds no second response to consume
    assert_eq!(service.mock().unwrap().calls(), 1);
}

/// Language mode: correct-script output passes the rules
#[tokio::test]
async fn test_pipeline_languageGate_shouldAcceptTargetScript() {
    let content = build_catalog("ru_RU", &[TestMessage::Pending("Open the file")]);
    let mut doc = parse_str(&content).unwrap();

    let mut config = test_config();
    config.target_language = "ru_RU".to_string();
    config.validation.mode = ValidationMode::Language;

    let script = vec![MockProvider::json_response(&[
        ("Open the file", "Открыть файл"),
    ])];
    let (translator, _service) = mock_translator(config, MockProvider::scripted(script));

    let (report, _stats) = translator.translate_document(&mut doc).await;
    assert_eq!(report.accepted, 1);
}

/// Semantic mode: back-translation plus judge; a false verdict rejects the
/// unit while the true one is accepted
#[tokio::test]
async fn test_pipeline_semanticGate_shouldFollowJudgeVerdicts() {
    let content = build_catalog(
        "fr_FR",
        &[
            TestMessage::Pending("Open the file"),
            TestMessage::Pending("Close the window"),
        ],
    );
    let mut doc = parse_str(&content).unwrap();

    let mut config = test_config();
    config.validation.mode = ValidationMode::Semantic;

    let script = vec![
        // Batch translation
        MockProvider::json_response(&[
            ("Open the file", "Ouvrir le fichier"),
            ("Close the window", "Fermer la fenêtre"),
        ]),
        // Back-translation of the candidates
        MockProvider::json_response(&[
            ("Ouvrir le fichier", "Open the file"),
            ("Fermer la fenêtre", "Paint the door"),
        ]),
        // Judge verdicts
        "[true, false]".to_string(),
    ];
    let (translator, _service) = mock_translator(config, MockProvider::scripted(script));

    let (report, _stats) = translator.translate_document(&mut doc).await;
    assert_eq!(report.accepted, 1);
    assert_eq!(report.rejected_semantic, 1);
    assert_eq!(doc.pending_count(), 1);

    let written = doc.to_ts_string();
    assert!(written.contains("<translation>Ouvrir le fichier</translation>"));
    assert!(!written.contains("Fermer la fenêtre"));
}

/// Semantic mode: when the judge is unusable, the lexical fallback decides
#[tokio::test]
async fn test_pipeline_semanticFallback_shouldUseLexicalSimilarity() {
    let content = build_catalog("fr_FR", &[TestMessage::Pending("Open the file")]);
    let mut doc = parse_str(&content).unwrap();

    let mut config = test_config();
    config.validation.mode = ValidationMode::Semantic;

    let script = vec![
        MockProvider::json_response(&[("Open the file", "Ouvrir le fichier")]),
        // Back-translation close to the source
        MockProvider::json_response(&[("Ouvrir le fichier", "Open the file")]),
        // Judge answers garbage; the lexical fallback takes over
        "I refuse to answer in the requested format".to_string(),
    ];
    let (translator, _service) = mock_translator(config, MockProvider::scripted(script));

    let (report, _stats) = translator.translate_document(&mut doc).await;
    assert_eq!(report.accepted, 1);
}

/// Accepted translations land in the cache; an identical later document is
/// filled without another backend call
#[tokio::test]
async fn test_pipeline_cache_shouldShortCircuitRepeatedSources() {
    let content = build_catalog("fr_FR", &[TestMessage::Pending("Open File")]);

    let script = vec![MockProvider::json_response(&[
        ("Open File", "Ouvrir un fichier"),
    ])];
    let (translator, service) = mock_translator(test_config(), MockProvider::scripted(script));

    let mut first = parse_str(&content).unwrap();
    let (report, _stats) = translator.translate_document(&mut first).await;
    assert_eq!(report.accepted, 1);
    assert_eq!(service.mock().unwrap().calls(), 1);

    // Same source again: served from cache, the exhausted script is never hit
    let mut second = parse_str(&content).unwrap();
    let (report, _stats) = translator.translate_document(&mut second).await;
    assert_eq!(report.accepted, 1);
    assert_eq!(service.mock().unwrap().calls(), 1);
}

/// The keep-marker option retains the unfinished marker on accepted slots
#[tokio::test]
async fn test_pipeline_keepMarker_shouldRetainUnfinishedAttribute() {
    let content = build_catalog("fr_FR", &[TestMessage::Pending("Open File")]);
    let mut doc = parse_str(&content).unwrap();

    let mut config = test_config();
    config.translation.common.keep_unfinished_marker = true;

    let script = vec![MockProvider::json_response(&[
        ("Open File", "Ouvrir un fichier"),
    ])];
    let (translator, _service) = mock_translator(config, MockProvider::scripted(script));

    let (report, _stats) = translator.translate_document(&mut doc).await;
    assert_eq!(report.accepted, 1);
    assert!(doc
        .to_ts_string()
        .contains("<translation type=\"unfinished\">Ouvrir un fichier</translation>"));
}
