//! Patient name extraction.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use medex_ner::{NerBackend, TaggedSentence};

use super::{FieldExtractor, Found};
use crate::patterns::PatternSet;

/// Names must be longer than one character.
const MIN_NAME_CHARS: usize = 2;

/// Which strategy produced a set of names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameStrategy {
    /// PERSON spans from a NER backend.
    Ner,
    /// Name cue patterns over the whole document.
    CuePatterns,
}

impl fmt::Display for NameStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameStrategy::Ner => write!(f, "NER"),
            NameStrategy::CuePatterns => write!(f, "cue patterns"),
        }
    }
}

/// Patient name extractor.
///
/// Uses the NER backend when there is one and falls back to the name cues
/// for a call in which the backend fails.
pub struct NameExtractor<'a> {
    patterns: &'a PatternSet,
    ner: Option<&'a dyn NerBackend>,
    fallback_on_empty: bool,
}

impl<'a> NameExtractor<'a> {
    pub fn new(patterns: &'a PatternSet, ner: Option<&'a dyn NerBackend>) -> Self {
        Self {
            patterns,
            ner,
            fallback_on_empty: false,
        }
    }

    /// Also use the cues when NER succeeds but finds no names.
    pub fn with_fallback_on_empty(mut self, enabled: bool) -> Self {
        self.fallback_on_empty = enabled;
        self
    }

    /// Extract names and report which strategy produced them.
    pub fn extract_with_strategy(&self, text: &str) -> (Vec<String>, NameStrategy) {
        let Some(ner) = self.ner else {
            return (self.extract_with_cues(text), NameStrategy::CuePatterns);
        };

        let result = ner.find_person_spans(text);
        // Adaptive data must not leak into the next document.
        ner.clear_adaptive_data();

        match result {
            Ok(sentences) => {
                let names = names_from_sentences(&sentences);
                if names.is_empty() && self.fallback_on_empty {
                    debug!("NER found no names, trying cue patterns");
                    return (self.extract_with_cues(text), NameStrategy::CuePatterns);
                }
                (names, NameStrategy::Ner)
            }
            Err(e) => {
                warn!(
                    "NER backend {} failed, using cue patterns for this document: {}",
                    ner.backend_id(),
                    e
                );
                (self.extract_with_cues(text), NameStrategy::CuePatterns)
            }
        }
    }

    /// Names captured by the cue patterns alone.
    pub fn extract_with_cues(&self, text: &str) -> Vec<String> {
        let mut found = Found::with_min_chars(MIN_NAME_CHARS);
        found.scan(&self.patterns.name_cues, text);
        found.into_vec()
    }
}

impl FieldExtractor for NameExtractor<'_> {
    fn extract(&self, text: &str) -> Vec<String> {
        let (names, strategy) = self.extract_with_strategy(text);
        debug!("Found {} names using {}", names.len(), strategy);
        names
    }
}

fn names_from_sentences(sentences: &[TaggedSentence]) -> Vec<String> {
    let mut found = Found::with_min_chars(MIN_NAME_CHARS);
    for sentence in sentences {
        for span in sentence.person_spans() {
            found.insert(&sentence.span_text(span));
        }
    }
    found.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use medex_ner::{parse_tagged_output, NerError};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const REPORT: &str = "Patient: Dr. Emily Johnson\nDate of Birth: March 15, 1978\nClaim Number: MED2024001234";

    /// Backend replaying fixed tagger output.
    struct Scripted {
        output: &'static str,
        clears: AtomicUsize,
    }

    impl Scripted {
        fn new(output: &'static str) -> Self {
            Self {
                output,
                clears: AtomicUsize::new(0),
            }
        }
    }

    impl NerBackend for Scripted {
        fn backend_id(&self) -> &str {
            "scripted"
        }

        fn find_person_spans(&self, _text: &str) -> medex_ner::Result<Vec<TaggedSentence>> {
            Ok(parse_tagged_output(self.output))
        }

        fn clear_adaptive_data(&self) {
            self.clears.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Failing {
        clears: AtomicUsize,
    }

    impl NerBackend for Failing {
        fn backend_id(&self) -> &str {
            "failing"
        }

        fn find_person_spans(&self, _text: &str) -> medex_ner::Result<Vec<TaggedSentence>> {
            Err(NerError::Inference("model exploded".to_string()))
        }

        fn clear_adaptive_data(&self) {
            self.clears.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_cue_patterns_strip_titles() {
        let extractor = NameExtractor::new(PatternSet::standard(), None);
        let (names, strategy) = extractor.extract_with_strategy(REPORT);

        assert_eq!(names, vec!["Emily Johnson"]);
        assert_eq!(strategy, NameStrategy::CuePatterns);
    }

    #[test]
    fn test_cue_patterns_dedup_across_patterns() {
        let extractor = NameExtractor::new(PatternSet::standard(), None);
        let names = extractor.extract(
            "Patient Mr. Robert Smith (DOB: 12/05/1965)\nPatient Name: Maria Garcia\nMs. Maria Garcia",
        );
        assert_eq!(names, vec!["Robert Smith", "Maria Garcia"]);
    }

    #[test]
    fn test_cue_patterns_need_capitalised_words() {
        let extractor = NameExtractor::new(PatternSet::standard(), None);
        assert!(extractor.extract("the patient: john smith").is_empty());
        assert!(extractor.extract("Patient: J. smith").is_empty());
    }

    #[test]
    fn test_cue_patterns_accept_single_word_names() {
        let extractor = NameExtractor::new(PatternSet::standard(), None);
        let names = extractor.extract("Referred by Dr. Smith\nPatient: Garcia");
        assert_eq!(names, vec!["Garcia", "Smith"]);
    }

    #[test]
    fn test_ner_spans_joined_and_deduplicated() {
        let backend = Scripted::new(
            "Dr. O\nEmily PERSON\nJohnson PERSON\nsaw O\nEmily PERSON\nJohnson PERSON\nand O\nX PERSON\n",
        );
        let extractor = NameExtractor::new(PatternSet::standard(), Some(&backend));
        let (names, strategy) = extractor.extract_with_strategy("ignored");

        assert_eq!(names, vec!["Emily Johnson"]);
        assert_eq!(strategy, NameStrategy::Ner);
        assert_eq!(backend.clears.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ner_failure_falls_back_for_that_call() {
        let backend = Failing {
            clears: AtomicUsize::new(0),
        };
        let extractor = NameExtractor::new(PatternSet::standard(), Some(&backend));
        let cues_only = NameExtractor::new(PatternSet::standard(), None);

        let (names, strategy) = extractor.extract_with_strategy(REPORT);
        assert_eq!(names, cues_only.extract(REPORT));
        assert_eq!(strategy, NameStrategy::CuePatterns);
        assert_eq!(backend.clears.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_ner_result_is_kept_by_default() {
        let backend = Scripted::new("Patient O\n");
        let extractor = NameExtractor::new(PatternSet::standard(), Some(&backend));
        assert!(extractor.extract(REPORT).is_empty());

        let extractor = extractor.with_fallback_on_empty(true);
        assert_eq!(extractor.extract(REPORT), vec!["Emily Johnson"]);
    }
}
