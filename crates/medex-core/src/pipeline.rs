//! Extraction pipeline combining NER and rule-based extractors.

use std::borrow::Cow;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use medex_ner::{load_backend, NerInit};

use crate::config::{ExtractionConfig, MedexConfig};
use crate::extract::{
    ClaimIdExtractor, DateOfBirthExtractor, FieldExtractor, NameExtractor, NameStrategy,
};
use crate::patterns::PatternSet;
use crate::result::ExtractionResult;
use crate::Result;

/// Patient information extractor.
///
/// Holds the compiled patterns and the NER backend for its whole lifetime.
/// Each call to [`extract`](Self::extract) is independent of the previous
/// ones.
pub struct PatientInfoExtractor {
    patterns: Cow<'static, PatternSet>,
    ner: NerInit,
    extraction: ExtractionConfig,
}

impl PatientInfoExtractor {
    /// Build an extractor from configuration, loading the NER backend.
    ///
    /// A missing model is not an error; names then come from cue patterns.
    pub fn new(config: &MedexConfig) -> Result<Self> {
        let ner = load_backend(&config.ner);
        Self::with_ner(config.extraction.clone(), ner)
    }

    /// Build an extractor around an already constructed NER state.
    pub fn with_ner(extraction: ExtractionConfig, ner: NerInit) -> Result<Self> {
        let patterns = if extraction.extra_claim_id_patterns.is_empty() {
            Cow::Borrowed(PatternSet::standard())
        } else {
            Cow::Owned(PatternSet::with_extra_claim_id_patterns(
                &extraction.extra_claim_id_patterns,
            )?)
        };

        Ok(Self {
            patterns,
            ner,
            extraction,
        })
    }

    /// Extractor using cue patterns only.
    pub fn without_ner() -> Self {
        Self {
            patterns: Cow::Borrowed(PatternSet::standard()),
            ner: NerInit::unavailable("disabled"),
            extraction: ExtractionConfig::default(),
        }
    }

    /// Strategy used for names when NER does not fail.
    pub fn name_strategy(&self) -> NameStrategy {
        if self.ner.is_available() {
            NameStrategy::Ner
        } else {
            NameStrategy::CuePatterns
        }
    }

    /// NER initialization state.
    pub fn ner(&self) -> &NerInit {
        &self.ner
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Extract patient names, dates of birth and claim IDs from text.
    pub fn extract(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();
        let patterns: &PatternSet = &self.patterns;

        let (patient_names, strategy) = NameExtractor::new(patterns, self.ner.backend())
            .with_fallback_on_empty(self.extraction.fallback_on_empty_ner)
            .extract_with_strategy(text);
        debug!("Names extracted using {}", strategy);

        let dates_of_birth =
            DateOfBirthExtractor::new(patterns, self.extraction.context_window).extract(text);
        let claim_ids = ClaimIdExtractor::new(patterns).extract(text);

        info!(
            "Extracted {} names, {} dates of birth, {} claim IDs from {} characters in {}ms",
            patient_names.len(),
            dates_of_birth.len(),
            claim_ids.len(),
            text.chars().count(),
            start.elapsed().as_millis()
        );

        ExtractionResult::new(patient_names, dates_of_birth, claim_ids)
    }

    /// Extract from a file.
    ///
    /// An unreadable file gives an empty result and a warning.
    pub fn extract_file(&self, path: impl AsRef<Path>) -> ExtractionResult {
        let path = path.as_ref();
        match read_document(path) {
            Ok(text) => self.extract(&text),
            Err(e) => {
                warn!("Could not read {}: {}", path.display(), e);
                ExtractionResult::default()
            }
        }
    }
}

/// Read a text document, normalizing every line ending to `\n`.
///
/// Every line, including the last one, ends with `\n`.
pub fn read_document(path: impl AsRef<Path>) -> Result<String> {
    let raw = std::fs::read_to_string(path)?;

    let mut text = String::with_capacity(raw.len() + 1);
    for line in raw.lines() {
        text.push_str(line);
        text.push('\n');
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextWindow;
    use crate::demo::DEMO_DOCUMENT;
    use medex_ner::{parse_tagged_output, NerBackend, NerError, TaggedSentence};
    use pretty_assertions::assert_eq;

    const REPORT: &str =
        "Patient: Dr. Emily Johnson\nDate of Birth: March 15, 1978\nClaim Number: MED2024001234";

    struct Failing;

    impl NerBackend for Failing {
        fn backend_id(&self) -> &str {
            "failing"
        }

        fn find_person_spans(&self, _text: &str) -> medex_ner::Result<Vec<TaggedSentence>> {
            Err(NerError::Inference("boom".to_string()))
        }
    }

    /// Tags every capitalised word after "Dr." as a person.
    struct DoctorTagger;

    impl NerBackend for DoctorTagger {
        fn backend_id(&self) -> &str {
            "doctor"
        }

        fn find_person_spans(&self, text: &str) -> medex_ner::Result<Vec<TaggedSentence>> {
            let mut lines = String::new();
            let mut in_name = false;
            for word in text.split_whitespace() {
                let tag = if word == "Dr." {
                    in_name = true;
                    "O"
                } else if in_name && word.starts_with(char::is_uppercase) {
                    "PERSON"
                } else {
                    in_name = false;
                    "O"
                };
                lines.push_str(&format!("{} {}\n", word, tag));
            }
            Ok(parse_tagged_output(&lines))
        }
    }

    #[test]
    fn test_concrete_report() {
        let result = PatientInfoExtractor::without_ner().extract(REPORT);

        assert_eq!(result.patient_names, vec!["Emily Johnson"]);
        assert_eq!(result.dates_of_birth, vec!["March 15, 1978"]);
        assert_eq!(result.claim_ids, vec!["Number", "MED2024001234"]);
    }

    #[test]
    fn test_claim_id_appears_once() {
        let result = PatientInfoExtractor::without_ner().extract("Claim ID: ABC987654321");
        assert_eq!(result.claim_ids, vec!["ABC987654321"]);
    }

    #[test]
    fn test_empty_input() {
        let result = PatientInfoExtractor::without_ner().extract("");
        assert!(result.is_empty());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let extractor = PatientInfoExtractor::without_ner();
        assert_eq!(extractor.extract(DEMO_DOCUMENT), extractor.extract(DEMO_DOCUMENT));
    }

    #[test]
    fn test_demo_document() {
        let result = PatientInfoExtractor::without_ner().extract(DEMO_DOCUMENT);

        assert_eq!(
            result.patient_names,
            vec!["Emily Johnson", "Robert Smith", "Maria Garcia"]
        );
        assert_eq!(
            result.dates_of_birth,
            vec!["March 15, 1978", "January 8, 1990", "12/05/1965"]
        );
        assert_eq!(
            result.claim_ids,
            vec!["Number", "ABC987654321", "MED2024001234", "XYZ123456789"]
        );
    }

    #[test]
    fn test_unavailable_ner_matches_cue_patterns() {
        let extractor =
            PatientInfoExtractor::with_ner(ExtractionConfig::default(), NerInit::unavailable("no model"))
                .unwrap();
        let cues = NameExtractor::new(PatternSet::standard(), None);

        assert_eq!(extractor.name_strategy(), NameStrategy::CuePatterns);
        assert_eq!(extractor.extract(DEMO_DOCUMENT).patient_names, cues.extract(DEMO_DOCUMENT));
    }

    #[test]
    fn test_failing_ner_degrades_per_call() {
        let extractor =
            PatientInfoExtractor::with_ner(ExtractionConfig::default(), NerInit::ready(Failing)).unwrap();

        assert_eq!(extractor.name_strategy(), NameStrategy::Ner);
        assert_eq!(extractor.extract(REPORT).patient_names, vec!["Emily Johnson"]);
        assert_eq!(extractor.extract(REPORT).patient_names, vec!["Emily Johnson"]);
    }

    #[test]
    fn test_ner_names_keep_document_order() {
        let extractor =
            PatientInfoExtractor::with_ner(ExtractionConfig::default(), NerInit::ready(DoctorTagger))
                .unwrap();
        let result = extractor.extract("Seen by Dr. Alan Grant today. Referred to Dr. Ellie Sattler");

        assert_eq!(result.patient_names, vec!["Alan Grant", "Ellie Sattler"]);
    }

    #[test]
    fn test_bounded_context_window() {
        let extraction = ExtractionConfig {
            context_window: ContextWindow::Bounded(30),
            ..ExtractionConfig::default()
        };
        let extractor =
            PatientInfoExtractor::with_ner(extraction, NerInit::unavailable("off")).unwrap();

        let result = extractor.extract("DOB 01/02/1950; admitted 03/04/2020");
        assert_eq!(result.dates_of_birth, vec!["01/02/1950"]);
    }

    #[test]
    fn test_extra_claim_patterns_from_config() {
        let extraction = ExtractionConfig {
            extra_claim_id_patterns: vec![r"\bPOL-(\d{6})\b".to_string()],
            ..ExtractionConfig::default()
        };
        let extractor =
            PatientInfoExtractor::with_ner(extraction, NerInit::unavailable("off")).unwrap();

        assert_eq!(extractor.extract("Policy POL-654321").claim_ids, vec!["654321"]);
    }

    #[test]
    fn test_invalid_extra_pattern_is_error() {
        let extraction = ExtractionConfig {
            extra_claim_id_patterns: vec!["(".to_string()],
            ..ExtractionConfig::default()
        };
        assert!(PatientInfoExtractor::with_ner(extraction, NerInit::unavailable("off")).is_err());
    }

    #[test]
    fn test_extract_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, REPORT.replace('\n', "\r\n")).unwrap();

        let result = PatientInfoExtractor::without_ner().extract_file(&path);
        assert_eq!(result.claim_ids, vec!["Number", "MED2024001234"]);
        assert_eq!(result.dates_of_birth, vec!["March 15, 1978"]);
    }

    #[test]
    fn test_extract_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let result = PatientInfoExtractor::without_ner().extract_file(dir.path().join("missing.txt"));
        assert!(result.is_empty());
    }

    #[test]
    fn test_read_document_normalizes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, "line one\r\nline two").unwrap();

        assert_eq!(read_document(&path).unwrap(), "line one\nline two\n");
    }
}
