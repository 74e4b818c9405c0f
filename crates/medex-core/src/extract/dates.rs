//! Date of birth extraction.

use tracing::debug;

use super::{FieldExtractor, Found};
use crate::config::ContextWindow;
use crate::patterns::PatternSet;

/// Date of birth extractor.
///
/// Dates near a birth cue ("Date of Birth", "DOB", "born", ...) win. Only
/// when no cue yields a date is the whole document searched.
///
/// Numeric dates are reported as written. `03/04/1990` matches both the
/// month-first and day-first patterns but appears once, unresolved.
pub struct DateOfBirthExtractor<'a> {
    patterns: &'a PatternSet,
    window: ContextWindow,
}

impl<'a> DateOfBirthExtractor<'a> {
    pub fn new(patterns: &'a PatternSet, window: ContextWindow) -> Self {
        Self { patterns, window }
    }

    /// Text following each birth cue, in cue-pattern then match order.
    pub fn context_windows<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.patterns
            .birth_cues
            .iter()
            .flat_map(|cue| cue.find_iter(text))
            .map(|m| self.window.apply(&text[m.end()..]))
            .collect()
    }
}

impl ContextWindow {
    /// Cut the window out of the text that follows a cue.
    pub fn apply<'t>(&self, rest: &'t str) -> &'t str {
        match *self {
            ContextWindow::RestOfLine => rest.split('\n').next().unwrap_or_default(),
            ContextWindow::Bounded(max_chars) => {
                let end = rest
                    .char_indices()
                    .take(max_chars)
                    .find(|(_, c)| matches!(c, '\n' | '.' | ';'))
                    .map(|(idx, _)| idx)
                    .unwrap_or_else(|| {
                        rest.char_indices()
                            .nth(max_chars)
                            .map(|(idx, _)| idx)
                            .unwrap_or(rest.len())
                    });
                &rest[..end]
            }
        }
    }
}

impl FieldExtractor for DateOfBirthExtractor<'_> {
    fn extract(&self, text: &str) -> Vec<String> {
        let windows = self.context_windows(text);
        debug!("Found {} birth-context windows", windows.len());

        let mut found = Found::with_min_chars(1);
        for window in &windows {
            found.scan(&self.patterns.dates, window);
        }

        if found.is_empty() {
            debug!("No birth-context dates, searching the whole document");
            found.scan(&self.patterns.dates, text);
        }

        found.into_vec()
    }
}
