//! Rule-based field extractors for medical reports.

pub mod claims;
pub mod dates;
pub mod names;

pub use claims::ClaimIdExtractor;
pub use dates::DateOfBirthExtractor;
pub use names::{NameExtractor, NameStrategy};

use indexmap::IndexSet;
use regex::Regex;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// Extract every distinct value in first-occurrence order.
    fn extract(&self, text: &str) -> Vec<String>;
}

/// Insertion-ordered, duplicate-free collection of extracted values.
#[derive(Debug, Default)]
pub(crate) struct Found {
    values: IndexSet<String>,
    min_chars: usize,
}

impl Found {
    /// Accept only trimmed values of at least `min_chars` characters.
    pub(crate) fn with_min_chars(min_chars: usize) -> Self {
        Self {
            values: IndexSet::new(),
            min_chars,
        }
    }

    pub(crate) fn insert(&mut self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || value.chars().count() < self.min_chars {
            return false;
        }
        self.values.insert(value.to_string())
    }

    /// Add group 1 of each match (or the whole match) of every pattern, in
    /// pattern order.
    pub(crate) fn scan(&mut self, patterns: &[Regex], text: &str) {
        for pattern in patterns {
            for caps in pattern.captures_iter(text) {
                if let Some(m) = caps.get(1).or_else(|| caps.get(0)) {
                    self.insert(m.as_str());
                }
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.values.into_iter().collect()
    }
}
