//! Entity tags and token spans.

use serde::{Deserialize, Serialize};

/// Entity category assigned by a NER model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Person,
    Organization,
    Location,
    Misc,
}

impl EntityCategory {
    /// Map a label suffix (`PER`, `PERSON`, `LOC`, ...) to a category.
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "PER" | "PERSON" => EntityCategory::Person,
            "ORG" | "ORGANIZATION" | "ORGANISATION" => EntityCategory::Organization,
            "LOC" | "LOCATION" | "GPE" => EntityCategory::Location,
            _ => EntityCategory::Misc,
        }
    }
}

/// Position of a token inside an entity mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// First token of a mention (`B-`, `S-`).
    Begin,
    /// Continuation token, or a plain label without a prefix.
    Inside,
}

/// Tag attached to a single token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityTag {
    Outside,
    Entity {
        boundary: Boundary,
        category: EntityCategory,
    },
}

impl EntityTag {
    /// Parse a model label.
    ///
    /// Accepts BIO/BIOES labels (`B-PER`, `I-LOC`, `E-ORG`), plain category
    /// labels as emitted by CRF taggers (`PERSON`, `LOCATION`) and `O`.
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label == "O" || label == "0" {
            return EntityTag::Outside;
        }

        let (boundary, rest) = match label.split_once('-') {
            Some((prefix, rest)) if prefix.len() == 1 => match prefix {
                "B" | "S" | "U" => (Boundary::Begin, rest),
                "I" | "E" | "L" => (Boundary::Inside, rest),
                _ => (Boundary::Inside, label),
            },
            _ => (Boundary::Inside, label),
        };

        EntityTag::Entity {
            boundary,
            category: EntityCategory::from_label(rest),
        }
    }

    /// Category of the tag, `None` for `O`.
    pub fn category(&self) -> Option<EntityCategory> {
        match self {
            EntityTag::Outside => None,
            EntityTag::Entity { category, .. } => Some(*category),
        }
    }

    pub fn is_person(&self) -> bool {
        self.category() == Some(EntityCategory::Person)
    }
}

/// A contiguous run of tokens `[start, end)` recognised as one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub category: EntityCategory,
}

impl EntitySpan {
    pub fn new(start: usize, end: usize, category: EntityCategory) -> Self {
        Self { start, end, category }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Tokens of one sentence together with the entity spans found in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedSentence {
    pub tokens: Vec<String>,
    pub spans: Vec<EntitySpan>,
}

impl TaggedSentence {
    pub fn new(tokens: Vec<String>, spans: Vec<EntitySpan>) -> Self {
        Self { tokens, spans }
    }

    /// Join the tokens covered by `span` with single spaces.
    ///
    /// Offsets past the end of the token list are clamped.
    pub fn span_text(&self, span: &EntitySpan) -> String {
        let end = span.end.min(self.tokens.len());
        let start = span.start.min(end);
        self.tokens[start..end].join(" ")
    }

    /// Spans tagged as persons, in sentence order.
    pub fn person_spans(&self) -> impl Iterator<Item = &EntitySpan> {
        self.spans
            .iter()
            .filter(|span| span.category == EntityCategory::Person)
    }
}

/// Collapse per-token tags into contiguous entity spans.
///
/// A run continues while consecutive tokens carry the same category and the
/// token is not marked as the beginning of a new mention.
pub fn spans_from_tags(tags: &[EntityTag]) -> Vec<EntitySpan> {
    let mut spans = Vec::new();
    let mut current: Option<(usize, EntityCategory)> = None;

    for (idx, tag) in tags.iter().enumerate() {
        match *tag {
            EntityTag::Outside => {
                if let Some((start, category)) = current.take() {
                    spans.push(EntitySpan::new(start, idx, category));
                }
            }
            EntityTag::Entity { boundary, category } => {
                let continues = matches!(
                    (current, boundary),
                    (Some((_, open)), Boundary::Inside) if open == category
                );
                if !continues {
                    if let Some((start, open)) = current.take() {
                        spans.push(EntitySpan::new(start, idx, open));
                    }
                    current = Some((idx, category));
                }
            }
        }
    }

    if let Some((start, category)) = current {
        spans.push(EntitySpan::new(start, tags.len(), category));
    }

    spans
}
