/*!
 * Target-language detection for candidate translations.
 *
 * Two stages: a rule-based check against Unicode script ranges and curated
 * keyword lists, and an AI yes/no classification when the rules are
 * inconclusive. A candidate failing both stages is rejected.
 *
 * The script and keyword tables below are the single canonical definition
 * of language membership in this crate.
 */

use crate::language_utils;
use crate::translation::core::TranslationService;
use crate::translation::prompts;

use super::{Evidence, Verdict};

/// Writing systems the rule-based stage can recognize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFamily {
    Latin,
    Cyrillic,
    Arabic,
    Han,
    Kana,
    Hangul,
    Thai,
    Greek,
    Hebrew,
    Devanagari,
}

impl ScriptFamily {
    /// Whether a character belongs to this script
    fn contains(&self, c: char) -> bool {
        let code = c as u32;
        match self {
            ScriptFamily::Latin => {
                c.is_ascii_alphabetic() || (0x00C0..=0x024F).contains(&code)
            }
            ScriptFamily::Cyrillic => (0x0400..=0x04FF).contains(&code),
            ScriptFamily::Arabic => {
                (0x0600..=0x06FF).contains(&code) || (0x0750..=0x077F).contains(&code)
            }
            ScriptFamily::Han => {
                (0x4E00..=0x9FFF).contains(&code) || (0x3400..=0x4DBF).contains(&code)
            }
            ScriptFamily::Kana => (0x3040..=0x30FF).contains(&code),
            ScriptFamily::Hangul => {
                (0xAC00..=0xD7AF).contains(&code) || (0x1100..=0x11FF).contains(&code)
            }
            ScriptFamily::Thai => (0x0E00..=0x0E7F).contains(&code),
            ScriptFamily::Greek => (0x0370..=0x03FF).contains(&code),
            ScriptFamily::Hebrew => (0x0590..=0x05FF).contains(&code),
            ScriptFamily::Devanagari => (0x0900..=0x097F).contains(&code),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ScriptFamily::Latin => "latin",
            ScriptFamily::Cyrillic => "cyrillic",
            ScriptFamily::Arabic => "arabic",
            ScriptFamily::Han => "han",
            ScriptFamily::Kana => "kana",
            ScriptFamily::Hangul => "hangul",
            ScriptFamily::Thai => "thai",
            ScriptFamily::Greek => "greek",
            ScriptFamily::Hebrew => "hebrew",
            ScriptFamily::Devanagari => "devanagari",
        }
    }
}

/// The scripts a language is expected to be written in
fn expected_scripts(language: &str, modifier: Option<&str>) -> Vec<ScriptFamily> {
    // Script modifiers override the language default (sr@latin)
    if let Some(modifier) = modifier {
        match modifier {
            "latin" => return vec![ScriptFamily::Latin],
            "cyrillic" => return vec![ScriptFamily::Cyrillic],
            _ => {}
        }
    }

    match language {
        "zh" => vec![ScriptFamily::Han],
        "ja" => vec![ScriptFamily::Kana, ScriptFamily::Han],
        "ko" => vec![ScriptFamily::Hangul],
        "ru" | "uk" | "bg" | "sr" | "mk" | "be" | "kk" => vec![ScriptFamily::Cyrillic],
        "ar" | "fa" | "ur" => vec![ScriptFamily::Arabic],
        "th" => vec![ScriptFamily::Thai],
        "el" => vec![ScriptFamily::Greek],
        "he" => vec![ScriptFamily::Hebrew],
        "hi" | "mr" | "ne" => vec![ScriptFamily::Devanagari],
        _ => vec![ScriptFamily::Latin],
    }
}

/// Function words for the Latin-script languages the rules can confirm
fn keywords(language: &str) -> &'static [&'static str] {
    match language {
        "fr" => &[
            "le", "la", "les", "de", "des", "du", "un", "une", "et", "est", "pour", "avec",
            "sur", "dans", "ne", "pas", "vous", "nous", "ce", "cette", "ouvrir", "fichier",
        ],
        "de" => &[
            "der", "die", "das", "und", "ist", "nicht", "ein", "eine", "mit", "für", "auf",
            "von", "zu", "den", "dem", "sie", "wir", "werden", "datei", "öffnen",
        ],
        "es" => &[
            "el", "la", "los", "las", "de", "del", "un", "una", "y", "es", "para", "con",
            "en", "no", "se", "que", "por", "su", "archivo", "abrir",
        ],
        "it" => &[
            "il", "lo", "la", "gli", "le", "di", "del", "un", "una", "e", "per", "con",
            "non", "si", "che", "da", "file", "apri",
        ],
        "pt" => &[
            "o", "a", "os", "as", "de", "do", "da", "um", "uma", "e", "para", "com",
            "não", "se", "que", "por", "arquivo", "abrir",
        ],
        "nl" => &[
            "de", "het", "een", "en", "is", "niet", "met", "voor", "van", "op", "aan",
            "je", "we", "deze", "dat", "bestand", "openen",
        ],
        "en" => &[
            "the", "a", "an", "and", "is", "not", "with", "for", "of", "on", "to", "you",
            "we", "this", "that", "file", "open",
        ],
        "pl" => &[
            "i", "w", "z", "na", "do", "nie", "jest", "się", "że", "to", "czy", "oraz",
            "plik", "otwórz",
        ],
        "tr" => &[
            "ve", "bir", "bu", "için", "ile", "değil", "dosya", "aç", "evet", "hayır",
        ],
        _ => &[],
    }
}

/// Diacritics that strongly suggest a specific Latin-script language
fn diacritics(language: &str) -> &'static [char] {
    match language {
        "fr" => &['é', 'è', 'ê', 'à', 'ç', 'ù', 'œ', 'î', 'ô'],
        "de" => &['ä', 'ö', 'ü', 'ß'],
        "es" => &['ñ', 'á', 'í', 'ó', 'ú', '¿', '¡'],
        "pt" => &['ã', 'õ', 'ç', 'á', 'ê', 'ó'],
        "pl" => &['ł', 'ą', 'ę', 'ś', 'ż', 'ź', 'ć', 'ń'],
        "tr" => &['ğ', 'ş', 'ı', 'İ'],
        "cs" => &['ř', 'ě', 'š', 'č', 'ž', 'ů', 'ý'],
        _ => &[],
    }
}

/// Rule-based detection outcome
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// The text matches the target language
    Match(Evidence),
    /// The text is clearly in a different script
    Mismatch(Evidence),
    /// The rules cannot tell; the AI fallback decides
    Inconclusive,
}

/// Two-stage language detector
#[derive(Debug, Clone, Default)]
pub struct LanguageDetector;

impl LanguageDetector {
    /// Stage 1: rule-based script and keyword detection
    pub fn detect(text: &str, target_language: &str) -> Detection {
        let Ok(parts) = language_utils::parse_locale(target_language) else {
            return Detection::Inconclusive;
        };
        let expected = expected_scripts(&parts.language, parts.modifier.as_deref());

        let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.is_empty() {
            // Nothing to classify (numbers, placeholders); no objection
            return Detection::Match(Evidence::DetectedLanguage("no-letters".to_string()));
        }

        let in_expected = letters
            .iter()
            .filter(|c| expected.iter().any(|s| s.contains(**c)))
            .count();
        let share = in_expected as f64 / letters.len() as f64;

        // Non-Latin targets are decided by script share alone
        if expected != [ScriptFamily::Latin] {
            return if share >= 0.5 {
                Detection::Match(Evidence::DetectedLanguage(expected[0].label().to_string()))
            } else {
                Detection::Mismatch(Evidence::DetectedLanguage(format!(
                    "expected {} script, found {:.0}%",
                    expected[0].label(),
                    share * 100.0
                )))
            };
        }

        // Latin targets: a foreign script dominating the text is a mismatch
        if share < 0.5 {
            return Detection::Mismatch(Evidence::DetectedLanguage(format!(
                "only {:.0}% latin letters",
                share * 100.0
            )));
        }

        // Keyword and diacritic confirmation for word-list-backed languages
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
            .collect();

        if let Some(hit) = words
            .iter()
            .find(|w| keywords(&parts.language).contains(&**w))
        {
            return Detection::Match(Evidence::DetectedLanguage(format!("keyword '{}'", hit)));
        }

        if let Some(mark) = lowered
            .chars()
            .find(|c| diacritics(&parts.language).contains(c))
        {
            return Detection::Match(Evidence::DetectedLanguage(format!("diacritic '{}'", mark)));
        }

        Detection::Inconclusive
    }

    /// Full check: rules first, AI yes/no classification on inconclusive
    pub async fn check(
        service: &TranslationService,
        text: &str,
        target_language: &str,
    ) -> Verdict {
        match Self::detect(text, target_language) {
            Detection::Match(evidence) => Verdict::pass_with(evidence),
            Detection::Mismatch(evidence) => {
                Verdict::fail_with("text is not in the target language", evidence)
            }
            Detection::Inconclusive => {
                let language_name = language_utils::get_language_name(target_language)
                    .unwrap_or_else(|_| target_language.to_string());
                let user = prompts::language_judge_user_prompt(text, &language_name);

                match service.yes_no(prompts::LANGUAGE_JUDGE, &user).await {
                    Ok(true) => Verdict::pass_with(Evidence::DetectedLanguage(
                        "ai-classified".to_string(),
                    )),
                    Ok(false) => Verdict::fail_with(
                        "AI classifier judged the text to be another language",
                        Evidence::DetectedLanguage("ai-classified".to_string()),
                    ),
                    Err(e) => Verdict::fail(format!("language check unavailable: {}", e)),
                }
            }
        }
    }
}
