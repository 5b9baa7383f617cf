/*!
 * Tests for the alignment invariant of the response reconciler.
 *
 * The reconciler's contract: a translation is never assigned to a unit
 * unless its identity is proven, positionally or by unique content match.
 */

use lingofill::catalog::{TranslationUnit, UnitRef};
use lingofill::translation::reconcile::{normalize, reconcile};
use lingofill::translation::ResponseItem;

fn unit(index: usize, source: &str) -> TranslationUnit {
    TranslationUnit {
        index,
        context: "Ctx".to_string(),
        source: source.to_string(),
        comment: None,
        target: UnitRef { context_idx: 0, message_idx: index },
        candidate: None,
    }
}

fn item(source: &str, translation: &str) -> ResponseItem {
    ResponseItem {
        source: Some(source.to_string()),
        translation: translation.to_string(),
        index: None,
    }
}

/// Every valid mapping points at a response whose echoed source equals the
/// unit's source after normalization
fn assert_alignment_invariant(units: &[TranslationUnit], responses: &[ResponseItem]) {
    for mapping in reconcile(units, responses) {
        let Some(response_index) = mapping.response_index else {
            assert!(!mapping.is_valid);
            continue;
        };
        assert!(mapping.is_valid);
        let unit_norm = normalize(&units[mapping.source_index].source);
        if let Some(echoed) = &responses[response_index].source {
            assert_eq!(normalize(echoed), unit_norm, "misassigned mapping");
        }
    }
}

#[test]
fn test_reconcile_rotatedResponses_shouldHoldAlignmentInvariant() {
    let units: Vec<_> = ["Alpha", "Bravo", "Charlie", "Delta", "Echo"]
        .iter()
        .enumerate()
        .map(|(i, s)| unit(i, s))
        .collect();

    // Rotated by two positions: every echo disagrees with its position
    let responses = vec![
        item("Charlie", "C"),
        item("Delta", "D"),
        item("Echo", "E"),
        item("Alpha", "A"),
        item("Bravo", "B"),
    ];

    assert_alignment_invariant(&units, &responses);
    let mappings = reconcile(&units, &responses);
    assert!(mappings.iter().all(|m| m.is_valid));
    assert_eq!(mappings[0].response_index, Some(3));
}

#[test]
fn test_reconcile_shortResponse_shouldFailClosedForMissing() {
    let units: Vec<_> = (0..4).map(|i| unit(i, &format!("String {}", i))).collect();
    let responses = vec![item("String 2", "Deux")];

    let mappings = reconcile(&units, &responses);
    assert_eq!(mappings.iter().filter(|m| m.is_valid).count(), 1);
    assert_eq!(mappings[2].response_index, Some(0));

    // Fail-closed invariant: nothing is ever filled from a wrong index
    assert_alignment_invariant(&units, &responses);
}

#[test]
fn test_reconcile_extraResponses_shouldIgnoreUnsolicitedEntries() {
    let units = vec![unit(0, "Yes"), unit(1, "No")];
    let responses = vec![
        item("Maybe", "Peut-être"),
        item("No", "Non"),
        item("Yes", "Oui"),
        item("Never", "Jamais"),
    ];

    let mappings = reconcile(&units, &responses);
    assert!(mappings.iter().all(|m| m.is_valid));
    assert_eq!(mappings[0].response_index, Some(2));
    assert_eq!(mappings[1].response_index, Some(1));
}

#[test]
fn test_reconcile_normalizedEchoes_shouldStillMatchPositionally() {
    // Curly quotes and extra whitespace in the echo must not break the
    // positional fast path
    let units = vec![unit(0, "Open \"File\""), unit(1, "Wait…")];
    let responses = vec![
        item("Open \u{201C}File\u{201D}", "Ouvrir « Fichier »"),
        item("Wait\u{2026} ", "Attendez…"),
    ];

    let mappings = reconcile(&units, &responses);
    assert!(mappings.iter().all(|m| m.is_valid));
    assert_eq!(mappings[0].response_index, Some(0));
}

#[test]
fn test_reconcile_mismatchNeverFallsBackToPosition() {
    // Position 1's echo names position 0's source; trusting positions here
    // would swap two translations silently
    let units = vec![unit(0, "Delete"), unit(1, "Save")];
    let responses = vec![item("Save", "Enregistrer"), item("Delete", "Supprimer")];

    let mappings = reconcile(&units, &responses);
    assert_eq!(mappings[0].response_index, Some(1));
    assert_eq!(mappings[1].response_index, Some(0));
    assert_alignment_invariant(&units, &responses);
}

#[test]
fn test_reconcile_unechoedEntriesAfterMismatch_shouldStayPending() {
    let units = vec![unit(0, "One"), unit(1, "Two"), unit(2, "Three")];
    // Count matches but one echo disagrees; the echo-less entry can no
    // longer be proven and must not be used
    let responses = vec![
        item("Two", "Deux"),
        ResponseItem { source: None, translation: "???".to_string(), index: None },
        item("Three", "Trois"),
    ];

    let mappings = reconcile(&units, &responses);
    assert!(!mappings[0].is_valid);
    assert!(mappings[1].is_valid);
    assert_eq!(mappings[1].response_index, Some(0));
    assert!(mappings[2].is_valid);
}
