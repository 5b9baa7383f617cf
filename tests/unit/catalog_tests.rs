/*!
 * Tests for catalog parsing, extraction, and serialization
 */

use crate::common::{build_catalog, create_temp_dir, create_test_file, TestMessage};

use lingofill::catalog::parser::{parse_file, parse_str};

#[test]
fn test_parseStr_canonicalCatalog_shouldExtractPendingOnly() {
    let content = build_catalog(
        "fr_FR",
        &[
            TestMessage::Pending("Open File"),
            TestMessage::Finished("Quit", "Quitter"),
            TestMessage::MarkedWithText("Save", "Enregistrer"),
            TestMessage::Pending("Close"),
        ],
    );

    let doc = parse_str(&content).unwrap();
    assert_eq!(doc.message_count(), 4);

    let units = doc.pending_units();
    assert_eq!(units.len(), 2);
    assert_eq!(units[0].source, "Open File");
    assert_eq!(units[1].source, "Close");
    assert_eq!(units[0].context, "MainWindow");
}

#[test]
fn test_parseStr_markedButFilledSlot_shouldNotBeReprocessed() {
    let content = build_catalog("fr_FR", &[TestMessage::MarkedWithText("Save", "Enregistrer")]);
    let doc = parse_str(&content).unwrap();
    assert_eq!(doc.pending_count(), 0);
}

#[test]
fn test_parseStr_vanishedTranslation_shouldRoundTripUntouched() {
    let content = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<!DOCTYPE TS>\n\
<TS version=\"2.1\" language=\"fr_FR\">\n\
<context>\n\
    <name>Old</name>\n\
    <message>\n\
        <source>Removed string</source>\n\
        <translation type=\"vanished\">Chaîne supprimée</translation>\n\
    </message>\n\
</context>\n\
</TS>\n";

    let doc = parse_str(content).unwrap();
    assert_eq!(doc.pending_count(), 0);
    assert_eq!(doc.to_ts_string(), content);
}

#[test]
fn test_parseStr_numerusMessage_shouldBeSkippedAndPreserved() {
    let content = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<!DOCTYPE TS>\n\
<TS version=\"2.1\" language=\"pl_PL\">\n\
<context>\n\
    <name>Files</name>\n\
    <message numerus=\"yes\">\n\
        <source>%n file(s)</source>\n\
        <translation type=\"unfinished\"><numerusform></numerusform></translation>\n\
    </message>\n\
</context>\n\
</TS>\n";

    let doc = parse_str(content).unwrap();
    // Plural slots carry nested markup, so they are not textually empty
    // and never enter the unit pipeline
    assert_eq!(doc.pending_units().len(), 0);
    assert_eq!(doc.to_ts_string(), content);
}

#[test]
fn test_parseStr_locationAndComments_shouldBePreservedVerbatim() {
    let content = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<!DOCTYPE TS>\n\
<TS version=\"2.1\" language=\"de_DE\">\n\
<context>\n\
    <name>Dialog</name>\n\
    <message>\n\
        <location filename=\"../src/dialog.cpp\" line=\"88\"/>\n\
        <source>Apply</source>\n\
        <comment>button label</comment>\n\
        <translatorcomment>keep short</translatorcomment>\n\
        <translation type=\"unfinished\"></translation>\n\
    </message>\n\
</context>\n\
</TS>\n";

    let doc = parse_str(content).unwrap();
    let units = doc.pending_units();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].comment.as_deref(), Some("button label"));
    assert_eq!(doc.to_ts_string(), content);
}

#[test]
fn test_parseStr_escapedEntities_shouldUnescapeForUnitsOnly() {
    let content = build_catalog("fr_FR", &[TestMessage::Pending("Save &amp; Quit")]);
    let doc = parse_str(&content).unwrap();

    let units = doc.pending_units();
    assert_eq!(units[0].source, "Save & Quit");
    // The raw escaped form is what serializes back out
    assert!(doc.to_ts_string().contains("<source>Save &amp; Quit</source>"));
}

#[test]
fn test_parseStr_twoSpaceIndent_shouldBeDetectedAndReused() {
    let content = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<!DOCTYPE TS>\n\
<TS version=\"2.1\" language=\"fr_FR\">\n\
<context>\n\
  <name>Small</name>\n\
  <message>\n\
    <source>Hi</source>\n\
    <translation type=\"unfinished\"></translation>\n\
  </message>\n\
</context>\n\
</TS>\n";

    let doc = parse_str(content).unwrap();
    assert_eq!(doc.indent_unit, "  ");
    assert_eq!(doc.to_ts_string(), content);
}

#[test]
fn test_parseStr_missingRoot_shouldError() {
    assert!(parse_str("<html><body>nope</body></html>").is_err());
    assert!(parse_str("").is_err());
}

#[test]
fn test_parseFile_saveTo_shouldRoundTripThroughDisk() {
    let dir = create_temp_dir().unwrap();
    let content = build_catalog(
        "es_ES",
        &[
            TestMessage::Pending("Open"),
            TestMessage::Finished("Close", "Cerrar"),
        ],
    );
    let path = create_test_file(&dir.path().to_path_buf(), "app_es_ES.ts", &content).unwrap();

    let doc = parse_file(&path).unwrap();
    assert_eq!(doc.path.as_deref(), Some(path.as_path()));

    let copy = dir.path().join("copy.ts");
    doc.save_to(&copy).unwrap();
    assert_eq!(std::fs::read_to_string(&copy).unwrap(), content);
}

#[test]
fn test_applyTranslation_thenSerialize_shouldOnlyTouchThatSlot() {
    let content = build_catalog(
        "fr_FR",
        &[TestMessage::Pending("Open File"), TestMessage::Pending("Close")],
    );
    let mut doc = parse_str(&content).unwrap();

    let units = doc.pending_units();
    assert!(doc.apply_translation(units[0].target, "Ouvrir un fichier", false));

    let written = doc.to_ts_string();
    assert!(written.contains("<translation>Ouvrir un fichier</translation>"));
    // The untouched entry keeps its pending slot exactly
    assert!(written.contains("<translation type=\"unfinished\"></translation>"));
    assert_eq!(doc.pending_count(), 1);
}
