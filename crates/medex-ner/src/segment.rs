//! Sentence boundary detection and word tokenization.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(
        r"(?i:mrs|mr|ms|dr|prof|jr|sr|st)\.|[\p{L}\p{N}]+(?:['’\-][\p{L}\p{N}]+)*|\S"
    ).unwrap();
}

/// Words after which a period does not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "dr", "mr", "mrs", "ms", "prof", "st", "jr", "sr", "no", "vs", "etc", "e.g", "i.e",
];

/// A word token with byte offsets into the sentence it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Split text into sentences.
///
/// Line breaks always end a sentence. `.`, `!` and `?` end one when followed
/// by whitespace and an uppercase letter or digit, unless the period closes
/// an abbreviation or a single-letter initial.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();

    for line in text.lines() {
        let mut start = 0;

        for (idx, ch) in line.char_indices() {
            if !matches!(ch, '.' | '!' | '?') {
                continue;
            }

            let end = idx + ch.len_utf8();
            let after = &line[end..];
            if !after.starts_with(char::is_whitespace) {
                continue;
            }

            let next_starts_sentence = after
                .trim_start()
                .chars()
                .next()
                .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit());
            if !next_starts_sentence {
                continue;
            }

            if ch == '.' && ends_with_abbreviation(&line[start..idx]) {
                continue;
            }

            push_trimmed(&mut sentences, &line[start..end]);
            start = end;
        }

        push_trimmed(&mut sentences, &line[start..]);
    }

    sentences
}

/// Split a sentence into word tokens.
///
/// Honorifics keep their period (`Dr.`), words keep inner apostrophes and
/// hyphens, and every other punctuation character becomes its own token.
pub fn tokenize(sentence: &str) -> Vec<Token<'_>> {
    TOKEN
        .find_iter(sentence)
        .map(|m| Token {
            text: m.as_str(),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, candidate: &'a str) {
    let candidate = candidate.trim();
    if !candidate.is_empty() {
        sentences.push(candidate);
    }
}

fn ends_with_abbreviation(prefix: &str) -> bool {
    let word = prefix
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric());

    let mut chars = word.chars();
    if let (Some(first), None) = (chars.next(), chars.next()) {
        if first.is_alphabetic() {
            return true;
        }
    }

    ABBREVIATIONS
        .iter()
        .any(|abbr| abbr.eq_ignore_ascii_case(word))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lines_are_sentences() {
        let text = "Patient: Dr. Emily Johnson\nDate of Birth: March 15, 1978\n\n";
        assert_eq!(
            split_sentences(text),
            vec!["Patient: Dr. Emily Johnson", "Date of Birth: March 15, 1978"]
        );
    }

    #[test]
    fn test_sentence_punctuation() {
        let text = "Mr. John Smith was seen today. He is stable! Follow up in 2 weeks.";
        assert_eq!(
            split_sentences(text),
            vec![
                "Mr. John Smith was seen today.",
                "He is stable!",
                "Follow up in 2 weeks."
            ]
        );
    }

    #[test]
    fn test_initials_do_not_split() {
        let text = "Seen by J. R. Tolkien. Discharged.";
        assert_eq!(split_sentences(text), vec!["Seen by J. R. Tolkien.", "Discharged."]);
    }

    #[test]
    fn test_lowercase_continuation_does_not_split() {
        let text = "Dose was 5 mg. at night.";
        assert_eq!(split_sentences(text), vec!["Dose was 5 mg. at night."]);
    }

    #[test]
    fn test_empty_text() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n\t\n").is_empty());
    }

    #[test]
    fn test_tokenize_keeps_honorific_period() {
        let words: Vec<&str> = tokenize("Patient: Dr. Emily Johnson").iter().map(|t| t.text).collect();
        assert_eq!(words, vec!["Patient", ":", "Dr.", "Emily", "Johnson"]);
    }

    #[test]
    fn test_tokenize_inner_punctuation() {
        let words: Vec<&str> = tokenize("Mary-Jane O'Brien (DOB: 12/05/1965)")
            .iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(
            words,
            vec!["Mary-Jane", "O'Brien", "(", "DOB", ":", "12", "/", "05", "/", "1965", ")"]
        );
    }

    #[test]
    fn test_token_offsets() {
        let sentence = "Ms. Ann Lee";
        let tokens = tokenize(sentence);
        assert_eq!(&sentence[tokens[1].start..tokens[1].end], "Ann");
        assert_eq!(tokens[2].end, sentence.len());
    }
}
