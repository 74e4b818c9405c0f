//! Regex patterns for medical report field extraction.
//!
//! Every list is ordered: extractors walk the patterns in sequence and keep
//! the first occurrence of each value, so reordering a list changes output
//! order.

use lazy_static::lazy_static;
use regex::Regex;

use crate::Result;

const MONTHS: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

/// Date formats, in match priority order.
fn date_sources() -> Vec<String> {
    vec![
        // MM/DD/YYYY or MM-DD-YYYY
        r"\b(0[1-9]|1[0-2])[/-](0[1-9]|[12][0-9]|3[01])[/-](19|20)\d{2}\b".to_string(),
        // DD/MM/YYYY or DD-MM-YYYY
        r"\b(0[1-9]|[12][0-9]|3[01])[/-](0[1-9]|1[0-2])[/-](19|20)\d{2}\b".to_string(),
        // YYYY-MM-DD
        r"\b(19|20)\d{2}[/-](0[1-9]|1[0-2])[/-](0[1-9]|[12][0-9]|3[01])\b".to_string(),
        // Month DD, YYYY
        format!(r"(?i)\b({MONTHS})\s+(0?[1-9]|[12][0-9]|3[01]),\s+(19|20)\d{{2}}\b"),
        // DD Month YYYY
        format!(r"(?i)\b(0?[1-9]|[12][0-9]|3[01])\s+({MONTHS})\s+(19|20)\d{{2}}\b"),
    ]
}

// Every claim pattern ignores case, codes included, so "Claim Number: X"
// also yields "Number".
const CLAIM_ID_SOURCES: &[&str] = &[
    r"(?i)\bclaim[\s#:-]*([A-Z0-9]{6,15})\b",
    r"(?i)\bclaim\s*id[\s#:-]*([A-Z0-9]{6,15})\b",
    r"(?i)\bclaim\s*number[\s#:-]*([A-Z0-9]{6,15})\b",
    r"(?i)\bclaim\s*no[\s#:-]*([A-Z0-9]{6,15})\b",
    r"(?i)\bid[\s#:-]*([A-Z0-9]{6,15})\b",
    // Generic alphanumeric ID
    r"(?i)\b([A-Z]{2,4}[0-9]{6,12})\b",
    // Pure numeric ID
    r"\b([0-9]{8,15})\b",
];

// One or more capitalized words, never across a line break. "Patient Name:"
// is a single cue.
const NAME_CUE_SOURCES: &[&str] = &[
    r"\bPatient(?:[ \t]+Name)?[ \t:]+(?:(?:Mrs|Mr|Ms|Dr)\.?[ \t]+)?([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)",
    r"\bName[ \t:]+(?:(?:Mrs|Mr|Ms|Dr)\.?[ \t]+)?([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)",
    r"\b(?:Mrs|Mr|Ms|Dr)\.?[ \t]+([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)",
];

// The context window starts where the cue match ends.
const BIRTH_CUE_SOURCES: &[&str] = &[
    r"(?i)\bbirth\s*date[\s:]*",
    r"(?i)\bdate\s*of\s*birth[\s:]*",
    r"(?i)\bborn(?:\s+on)?[\s:]*",
    r"(?i)\bDOB[\s:]*",
];

lazy_static! {
    static ref STANDARD: PatternSet = PatternSet::compile_standard()
        .expect("built-in patterns are valid");
}

/// Compiled pattern lists shared by the extractors.
#[derive(Debug, Clone)]
pub struct PatternSet {
    /// Date formats.
    pub dates: Vec<Regex>,
    /// Claim identifier formats; group 1, when present, is the identifier.
    pub claim_ids: Vec<Regex>,
    /// Name cues used when NER is not available; group 1 is the name.
    pub name_cues: Vec<Regex>,
    /// Birth-context cue phrases.
    pub birth_cues: Vec<Regex>,
}

impl PatternSet {
    /// The built-in pattern set, compiled once per process.
    pub fn standard() -> &'static PatternSet {
        &STANDARD
    }

    /// The built-in set with additional claim-id patterns appended.
    pub fn with_extra_claim_id_patterns(extra: &[String]) -> Result<PatternSet> {
        let mut set = Self::standard().clone();
        for source in extra {
            set.claim_ids.push(Regex::new(source)?);
        }
        Ok(set)
    }

    fn compile_standard() -> Result<PatternSet> {
        Ok(PatternSet {
            dates: compile(date_sources().iter().map(String::as_str))?,
            claim_ids: compile(CLAIM_ID_SOURCES.iter().copied())?,
            name_cues: compile(NAME_CUE_SOURCES.iter().copied())?,
            birth_cues: compile(BIRTH_CUE_SOURCES.iter().copied())?,
        })
    }
}

fn compile<'a>(sources: impl Iterator<Item = &'a str>) -> Result<Vec<Regex>> {
    sources
        .map(|source| Regex::new(source).map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(patterns: &[Regex], text: &str) -> Vec<String> {
        patterns
            .iter()
            .flat_map(|p| p.find_iter(text).map(|m| m.as_str().to_string()))
            .collect()
    }

    #[test]
    fn test_standard_counts() {
        let set = PatternSet::standard();
        assert_eq!(set.dates.len(), 5);
        assert_eq!(set.claim_ids.len(), 7);
        assert_eq!(set.name_cues.len(), 3);
        assert_eq!(set.birth_cues.len(), 4);
    }

    #[test]
    fn test_date_formats() {
        let set = PatternSet::standard();
        for date in ["01/15/1985", "15-01-1985", "1985-01-15", "March 15, 1978", "15 january 1985", "January 8, 1990"] {
            assert!(
                set.dates.iter().any(|p| p.is_match(date)),
                "no pattern matched {}",
                date
            );
        }
        assert!(matches(&set.dates, "13/13/1985").is_empty());
        assert!(matches(&set.dates, "01/15/1885").is_empty());
    }

    #[test]
    fn test_claim_patterns_ignore_case() {
        let set = PatternSet::standard();
        let caps = set.claim_ids[1].captures("claim id: abc1234567").unwrap();
        assert_eq!(&caps[1], "abc1234567");
        assert!(set.claim_ids[5].is_match("ref xyz123456"));

        let caps = set.claim_ids[0].captures("Claim Number: MED2024001234").unwrap();
        assert_eq!(&caps[1], "Number");
    }

    #[test]
    fn test_single_word_name_cue() {
        let set = PatternSet::standard();
        let caps = set.name_cues[2].captures("Referred by Dr. Smith
").unwrap();
        assert_eq!(&caps[1], "Smith");

        let caps = set.name_cues[0].captures("Patient Name: Maria Garcia").unwrap();
        assert_eq!(&caps[1], "Maria Garcia");
    }

    #[test]
    fn test_name_cue_stays_on_one_line() {
        let set = PatternSet::standard();
        let caps = set.name_cues[2]
            .captures("Dr. Emily Johnson\nDate of Birth")
            .unwrap();
        assert_eq!(&caps[1], "Emily Johnson");
    }

    #[test]
    fn test_extra_claim_patterns_are_appended() {
        let set = PatternSet::with_extra_claim_id_patterns(&[r"\bPOL-(\d{6})\b".to_string()]).unwrap();
        assert_eq!(set.claim_ids.len(), 8);
        assert!(set.claim_ids[7].is_match("POL-123456"));
    }

    #[test]
    fn test_invalid_extra_pattern() {
        let result = PatternSet::with_extra_claim_id_patterns(&["(unclosed".to_string()]);
        assert!(result.is_err());
    }
}
