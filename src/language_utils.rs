use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for locale and ISO language code handling
///
/// Catalog files are named by Qt locale identifiers (`fr_FR`, `zh_CN`,
/// `sr@latin`), while providers and validators work with plain ISO 639
/// codes. This module converts between the two and matches codes across
/// ISO 639-1 (2-letter) and ISO 639-2/T (3-letter) forms.
/// Parts of a Qt locale identifier
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleParts {
    /// ISO 639 language subtag, lowercased (e.g. "fr")
    pub language: String,
    /// Territory subtag if present, uppercased (e.g. "FR")
    pub territory: Option<String>,
    /// Script modifier if present, lowercased (e.g. "latin")
    pub modifier: Option<String>,
}

/// Split a Qt locale identifier into language, territory, and modifier.
///
/// Accepts `fr`, `fr_FR`, `fr-FR`, `sr@latin`, and `sr_RS@latin`.
pub fn parse_locale(locale: &str) -> Result<LocaleParts> {
    let trimmed = locale.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Empty locale identifier"));
    }

    let (base, modifier) = match trimmed.split_once('@') {
        Some((b, m)) if !m.is_empty() => (b, Some(m.to_lowercase())),
        Some((b, _)) => (b, None),
        None => (trimmed, None),
    };

    let mut pieces = base.splitn(2, ['_', '-']);
    let language = pieces.next().unwrap_or_default().to_lowercase();
    let territory = pieces.next().map(|t| t.to_uppercase()).filter(|t| !t.is_empty());

    if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(anyhow!("Invalid locale identifier: {}", locale));
    }

    Ok(LocaleParts {
        language,
        territory,
        modifier,
    })
}

/// Extract the bare language subtag from a locale identifier
pub fn language_part(locale: &str) -> Result<String> {
    Ok(parse_locale(locale)?.language)
}

/// Normalize a language code or locale to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let language = language_part(code)?;

    // If it's a 2-letter code, convert to 3-letter
    if language.len() == 2 {
        if let Some(lang) = Language::from_639_1(&language) {
            return Ok(lang.to_639_3().to_string());
        }
    }
    // If it's already a 3-letter code, ensure it's ISO 639-2/T
    else if language.len() == 3 {
        if Language::from_639_3(&language).is_some() {
            return Ok(language);
        }

        // Check if it's a ISO 639-2/B code that needs converting to ISO 639-2/T
        if let Some(part2t) = part2b_to_part2t(&language) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Map the ISO 639-2/B codes that differ from their 639-2/T equivalents
fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    match code {
        "fre" => Some("fra"), // French
        "ger" => Some("deu"), // German
        "dut" => Some("nld"), // Dutch
        "gre" => Some("ell"), // Greek
        "chi" => Some("zho"), // Chinese
        "cze" => Some("ces"), // Czech
        "ice" => Some("isl"), // Icelandic
        "alb" => Some("sqi"), // Albanian
        "arm" => Some("hye"), // Armenian
        "baq" => Some("eus"), // Basque
        "bur" => Some("mya"), // Burmese
        "per" => Some("fas"), // Persian
        "geo" => Some("kat"), // Georgian
        "may" => Some("msa"), // Malay
        "mac" => Some("mkd"), // Macedonian
        "rum" => Some("ron"), // Romanian
        "slo" => Some("slk"), // Slovak
        "wel" => Some("cym"), // Welsh
        _ => None,
    }
}

/// Check if two language codes or locales match (represent the same language).
///
/// Territory and script modifiers are ignored: `fr_FR` matches `fra`, and
/// `sr@latin` matches `sr_RS`.
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    let normalized1 = match normalize_to_part2t(code1) {
        Ok(n) => n,
        Err(_) => return false,
    };

    let normalized2 = match normalize_to_part2t(code2) {
        Ok(n) => n,
        Err(_) => return false,
    };

    normalized1 == normalized2
}

/// Get the English language name from a code or locale identifier
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Derive the target locale from a catalog filename stem.
///
/// Catalog files follow the `<app>_<locale>.ts` convention; the locale is
/// everything after the first underscore that parses as a locale with a
/// known language. `myapp_zh_CN` yields `zh_CN`.
pub fn locale_from_file_stem(stem: &str) -> Option<String> {
    // Scan left to right so the longest suffix with a known language wins:
    // "my_app_zh_CN" must yield "zh_CN", not "CN".
    let split_points: Vec<usize> = stem
        .char_indices()
        .filter(|(_, c)| *c == '_')
        .map(|(i, _)| i)
        .collect();

    for idx in split_points {
        let candidate = &stem[idx + 1..];
        if let Ok(parts) = parse_locale(candidate) {
            if normalize_to_part2t(&parts.language).is_ok() {
                return Some(candidate.to_string());
            }
        }
    }

    None
}
