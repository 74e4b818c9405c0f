//! External tagger process backend.
//!
//! CRF taggers such as Stanford NER print one token per line with the tag
//! in the last column. The whole document is treated as one sentence.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

use crate::backend::NerBackend;
use crate::config::TaggerConfig;
use crate::error::NerError;
use crate::span::{spans_from_tags, EntityCategory, EntityTag, TaggedSentence};
use crate::Result;

/// NER backend that pipes the document through an external tagger.
#[derive(Debug, Clone)]
pub struct TaggedOutputBackend {
    program: PathBuf,
    args: Vec<String>,
}

impl TaggedOutputBackend {
    /// Resolve the tagger program, failing if it cannot be found.
    pub fn new(config: &TaggerConfig) -> Result<Self> {
        let program = resolve_program(&config.program).ok_or_else(|| {
            NerError::Tagger(format!("tagger program '{}' not found", config.program))
        })?;

        debug!("Using external tagger: {}", program.display());

        Ok(Self {
            program,
            args: config.args.clone(),
        })
    }

    fn run(&self, text: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| NerError::Tagger(format!("failed to start {}: {}", self.program.display(), e)))?;

        // stdin is fed from its own thread; the tagger may fill the stdout
        // pipe before it has read the whole document.
        let stdin = child.stdin.take();
        let (output, written) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(text.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (output, writer.join())
        });

        let output = output?;
        if !output.status.success() {
            return Err(NerError::Tagger(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        written
            .map_err(|_| NerError::Tagger("stdin writer panicked".to_string()))?
            .map_err(|e| NerError::Tagger(format!("failed to write to {}: {}", self.program.display(), e)))?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl NerBackend for TaggedOutputBackend {
    fn backend_id(&self) -> &str {
        "tagger"
    }

    fn find_person_spans(&self, text: &str) -> Result<Vec<TaggedSentence>> {
        let output = self.run(text)?;
        Ok(parse_tagged_output(&output))
    }
}

/// Parse `word ... TAG` lines into a single tagged sentence.
///
/// Lines with fewer than two fields are ignored; they neither add a token
/// nor interrupt a running person mention.
pub fn parse_tagged_output(output: &str) -> Vec<TaggedSentence> {
    let mut tokens = Vec::new();
    let mut tags = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            continue;
        }
        tokens.push(fields[0].to_string());
        tags.push(EntityTag::parse(fields[fields.len() - 1]));
    }

    if tokens.is_empty() {
        return Vec::new();
    }

    let spans = spans_from_tags(&tags)
        .into_iter()
        .filter(|span| span.category == EntityCategory::Person)
        .collect();

    vec![TaggedSentence::new(tokens, spans)]
}

fn resolve_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|path| path.is_file())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(sentences: &[TaggedSentence]) -> Vec<String> {
        sentences
            .iter()
            .flat_map(|s| s.person_spans().map(|span| s.span_text(span)))
            .collect()
    }

    #[test]
    fn test_parse_person_runs() {
        let output = "Patient O\nEmily PERSON\nJohnson PERSON\nwas O\nseen O\nby O\nDr. O\nAlan PERSON\nGrant PERSON\n";
        let sentences = parse_tagged_output(output);

        assert_eq!(sentences.len(), 1);
        assert_eq!(names(&sentences), vec!["Emily Johnson", "Alan Grant"]);
    }

    #[test]
    fn test_tag_taken_from_last_column() {
        let output = "Emily NNP B-PER\nJohnson NNP I-PER\narrived VBD O\n";
        assert_eq!(names(&parse_tagged_output(output)), vec!["Emily Johnson"]);
    }

    #[test]
    fn test_short_lines_are_skipped() {
        let output = "Emily PERSON\n\nJohnson PERSON\nstray\n";
        let sentences = parse_tagged_output(output);

        assert_eq!(sentences[0].tokens, vec!["Emily", "Johnson"]);
        assert_eq!(names(&sentences), vec!["Emily Johnson"]);
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_tagged_output("").is_empty());
        assert!(parse_tagged_output("\n\n").is_empty());
    }

    #[test]
    fn test_missing_program() {
        let config = TaggerConfig {
            program: "medex-no-such-tagger".to_string(),
            args: Vec::new(),
        };
        match TaggedOutputBackend::new(&config) {
            Err(NerError::Tagger(msg)) => assert!(msg.contains("medex-no-such-tagger")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_program_over_stdin() {
        // `cat` echoes the pre-tagged input back
        let Some(_) = resolve_program("cat") else {
            return;
        };
        let backend = TaggedOutputBackend::new(&TaggerConfig {
            program: "cat".to_string(),
            args: Vec::new(),
        })
        .unwrap();

        let sentences = backend.find_person_spans("Dr. O\nJane PERSON\nDoe PERSON\n").unwrap();
        assert_eq!(backend.backend_id(), "tagger");
        assert_eq!(names(&sentences), vec!["Jane Doe"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_large_document_does_not_block() {
        let Some(_) = resolve_program("cat") else {
            return;
        };
        let backend = TaggedOutputBackend::new(&TaggerConfig {
            program: "cat".to_string(),
            args: Vec::new(),
        })
        .unwrap();

        let document = "Jane PERSON\n".repeat(200_000);
        let sentences = backend.find_person_spans(&document).unwrap();

        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].tokens.len(), 200_000);
    }
}
