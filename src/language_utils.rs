use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Codes are ISO 639-1 (2-letter) or ISO 639-2 (3-letter). Two sentinels
/// are understood on top of them: `auto` for the spoken language (let the
/// transcriber detect it) and `none` for the target language (skip
/// translation).

/// Source language sentinel: detect automatically
pub const AUTO_DETECT: &str = "auto";

/// Target language sentinel: do not translate
pub const NO_TRANSLATION: &str = "none";

/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

// ISO 639-2/B codes that differ from their 639-2/T form
fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    match code {
        "fre" => Some("fra"),
        "ger" => Some("deu"),
        "dut" => Some("nld"),
        "gre" => Some("ell"),
        "chi" => Some("zho"),
        "cze" => Some("ces"),
        "ice" => Some("isl"),
        "alb" => Some("sqi"),
        "arm" => Some("hye"),
        "baq" => Some("eus"),
        "bur" => Some("mya"),
        "per" => Some("fas"),
        "geo" => Some("kat"),
        "may" => Some("msa"),
        "mac" => Some("mkd"),
        "rum" => Some("ron"),
        "slo" => Some("slk"),
        "wel" => Some("cym"),
        _ => None,
    }
}

fn lookup(code: &str) -> Option<(Language, LanguageCodeType)> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized).map(|l| (l, LanguageCodeType::Part1)),
        3 => Language::from_639_3(&normalized)
            .map(|l| (l, LanguageCodeType::Part2T))
            .or_else(|| {
                part2b_to_part2t(&normalized)
                    .and_then(Language::from_639_3)
                    .map(|l| (l, LanguageCodeType::Part2B))
            }),
        _ => None,
    }
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    lookup(code)
        .map(|(_, kind)| kind)
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    lookup(code)
        .map(|(lang, _)| lang.to_639_3().to_string())
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let (lang, _) = lookup(code).ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;
    Ok(lang
        .to_639_1()
        .map(|c| c.to_string())
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let (lang, _) = lookup(code).ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    Ok(lang.to_name().to_string())
}

/// Check a source language setting: `auto` or a valid code
pub fn validate_source_language(code: &str) -> Result<()> {
    if code.eq_ignore_ascii_case(AUTO_DETECT) {
        return Ok(());
    }
    validate_language_code(code).map(|_| ())
}

/// Check a target language setting: `none` or a valid code
pub fn validate_target_language(code: &str) -> Result<()> {
    if is_no_translation(code) {
        return Ok(());
    }
    validate_language_code(code).map(|_| ())
}

/// Whether a target language setting disables translation
pub fn is_no_translation(code: &str) -> bool {
    let trimmed = code.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_TRANSLATION)
}

/// Code to hand to a transcriber, `None` for automatic detection
pub fn transcription_language(code: &str) -> Option<String> {
    if code.trim().is_empty() || code.eq_ignore_ascii_case(AUTO_DETECT) {
        return None;
    }
    Some(normalize_to_part1_or_part2t(code).unwrap_or_else(|_| code.trim().to_lowercase()))
}
