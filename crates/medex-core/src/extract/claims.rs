//! Claim identifier extraction.

use tracing::debug;

use super::{FieldExtractor, Found};
use crate::patterns::PatternSet;

/// Shortest accepted claim identifier, in characters.
pub const MIN_CLAIM_ID_CHARS: usize = 6;

/// Claim identifier extractor.
///
/// Runs every claim-id pattern over the whole document. The bare
/// alphanumeric and numeric patterns also pick up phone and record numbers;
/// callers get all of them.
pub struct ClaimIdExtractor<'a> {
    patterns: &'a PatternSet,
}

impl<'a> ClaimIdExtractor<'a> {
    pub fn new(patterns: &'a PatternSet) -> Self {
        Self { patterns }
    }
}

impl FieldExtractor for ClaimIdExtractor<'_> {
    fn extract(&self, text: &str) -> Vec<String> {
        let mut found = Found::with_min_chars(MIN_CLAIM_ID_CHARS);
        found.scan(&self.patterns.claim_ids, text);

        let ids = found.into_vec();
        debug!("Found {} claim IDs", ids.len());
        ids
    }
}
