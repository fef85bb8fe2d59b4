// 🔍 Text Extractor - candidate person records and id numbers from free text
//
// Two modes:
// - extract_records: one person per line ("NOME COMPLETO 06819885253 08/07/1957")
// - extract_id_numbers: loose pasted lists (punctuated or bare numbers)

use crate::checksum::{strip_digits, validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

// ============================================================================
// CORE TYPES
// ============================================================================

/// MatchKind - which pattern of the cascade produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    /// name + exactly 11 digits + DD/MM/YYYY
    Strict,
    /// name + 8..15 digits + DD/MM/YYYY
    FlexibleLength,
    /// name + 8..15 digits, date optional
    LastResort,
}

impl MatchKind {
    pub fn name(&self) -> &str {
        match self {
            MatchKind::Strict => "strict",
            MatchKind::FlexibleLength => "flexible-length",
            MatchKind::LastResort => "last-resort",
        }
    }
}

/// CandidateRecord - output of extract_records()
/// Raw fields before the record is stamped and enriched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: String,          // Whitespace-normalized
    pub id_number: String,     // Digit run verbatim (8-15 digits)
    pub date_of_birth: String, // DD/MM/YYYY or empty
    pub is_valid: bool,        // Checksum result at extraction time

    // Provenance
    pub line_number: usize, // 1-based, among non-empty lines
    pub raw_line: String,
    pub match_kind: MatchKind,
}

/// Fields a matcher pulls out of one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFields {
    pub name: String,
    pub id_number: String,
    pub date_of_birth: String,
}

// ============================================================================
// MATCHER CASCADE
// ============================================================================

/// LineMatcher - one step of the progressively looser cascade
pub trait LineMatcher: Send + Sync {
    fn kind(&self) -> MatchKind;

    /// Try to split a trimmed, non-empty line into its fields
    fn match_line(&self, line: &str) -> Option<LineFields>;
}

/// Regex-backed matcher: group 1 = name, 2 = digits, 3 = optional date
pub struct PatternMatcher {
    kind: MatchKind,
    pattern: Regex,
}

impl PatternMatcher {
    fn new(kind: MatchKind, pattern: &str) -> Self {
        PatternMatcher {
            kind,
            pattern: Regex::new(pattern).expect("valid regex"),
        }
    }
}

impl LineMatcher for PatternMatcher {
    fn kind(&self) -> MatchKind {
        self.kind
    }

    fn match_line(&self, line: &str) -> Option<LineFields> {
        let caps = self.pattern.captures(line)?;

        Some(LineFields {
            name: normalize_name(caps.get(1)?.as_str()),
            id_number: caps.get(2)?.as_str().to_string(),
            date_of_birth: caps
                .get(3)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        })
    }
}

/// Ordered cascade, first match wins
static CASCADE: LazyLock<Vec<PatternMatcher>> = LazyLock::new(|| {
    vec![
        PatternMatcher::new(
            MatchKind::Strict,
            r"^(.+?)\s+([0-9]{11})\s+([0-9]{2}/[0-9]{2}/[0-9]{4})$",
        ),
        PatternMatcher::new(
            MatchKind::FlexibleLength,
            r"^(.+?)\s+([0-9]{8,15})\s+([0-9]{2}/[0-9]{2}/[0-9]{4})$",
        ),
        PatternMatcher::new(
            MatchKind::LastResort,
            r"^(.+?)\s+([0-9]{8,15})(?:\s+([0-9]{2}/[0-9]{2}/[0-9]{4}))?$",
        ),
    ]
});

static FORMATTED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{3}\.[0-9]{3}\.[0-9]{3}-[0-9]{2}").expect("valid regex"));

static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\b)[0-9]{11}(?-u:\b)").expect("valid regex"));

/// Run a line through a cascade of matchers
pub fn match_with<'a, M: LineMatcher + 'a>(
    matchers: impl IntoIterator<Item = &'a M>,
    line: &str,
) -> Option<(MatchKind, LineFields)> {
    matchers
        .into_iter()
        .find_map(|m| m.match_line(line).map(|fields| (m.kind(), fields)))
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Extract person records, one per matching line.
///
/// Lines that match none of the patterns are dropped silently. Records with a
/// failing checksum are kept and marked `is_valid = false`. Output follows
/// input order, no deduplication.
pub fn extract_records(text: &str) -> Vec<CandidateRecord> {
    let mut records = Vec::new();

    let lines = text.split('\n').map(str::trim).filter(|l| !l.is_empty());

    for (index, line) in lines.enumerate() {
        let Some((kind, fields)) = match_with(CASCADE.iter(), line) else {
            debug!(line_number = index + 1, "no pattern matched, line skipped");
            continue;
        };

        let is_valid = validate(&fields.id_number);
        debug!(
            line_number = index + 1,
            pattern = kind.name(),
            is_valid,
            "candidate extracted"
        );

        records.push(CandidateRecord {
            name: fields.name,
            id_number: fields.id_number,
            date_of_birth: fields.date_of_birth,
            is_valid,
            line_number: index + 1,
            raw_line: line.to_string(),
            match_kind: kind,
        });
    }

    records
}

/// Locate id numbers in a loose list.
///
/// Punctuated numbers are collected first and cut out of the text, then bare
/// 11-digit runs on ASCII word boundaries. Matches are deduplicated as
/// written (first occurrence wins), then stripped to digits, so a punctuated
/// and a bare spelling of one number both come back. Nothing is validated here.
pub fn extract_id_numbers(text: &str) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let formatted: Vec<&str> = FORMATTED_ID
        .find_iter(&normalized)
        .map(|m| m.as_str())
        .collect();

    let mut remaining = normalized.clone();
    for m in &formatted {
        remaining = remaining.replacen(m, "", 1);
    }

    let bare: Vec<&str> = BARE_ID.find_iter(&remaining).map(|m| m.as_str()).collect();

    let mut seen = HashSet::new();
    let numbers: Vec<String> = formatted
        .into_iter()
        .chain(bare)
        .filter(|m| seen.insert(*m))
        .map(strip_digits)
        .collect();

    debug!(count = numbers.len(), "id numbers located");
    numbers
}

fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
