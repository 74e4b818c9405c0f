//! Batch command for multiple report files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use medex_core::{read_document, ExtractionResult, PatientInfoExtractor};

use super::extract::{format_result, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input files
    #[arg(required = true)]
    input: String,

    /// Output directory (default: print to stdout)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Disable NER and use cue patterns for names
    #[arg(long)]
    no_ner: bool,

    /// NER model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// Result of processing a single file.
struct FileOutcome {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    super::apply_ner_overrides(&mut config, args.no_ner, args.model_dir.clone());

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let extractor = PatientInfoExtractor::new(&config)?;

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut outcomes = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let read = read_document(&path);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match read {
            Ok(text) => {
                let result = extractor.extract(&text);
                outcomes.push(FileOutcome {
                    path,
                    result: Some(result),
                    error: None,
                    processing_time_ms: file_start.elapsed().as_millis() as u64,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    outcomes.push(FileOutcome {
                        path,
                        result: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_and_clear();

    let mut taken = HashSet::new();
    for outcome in &outcomes {
        let Some(result) = &outcome.result else {
            continue;
        };
        let content = format_result(result, args.format)?;

        match &args.output_dir {
            Some(output_dir) => {
                let output_name =
                    output_file_name(&outcome.path, args.format.extension(), &mut taken);
                let output_path = output_dir.join(output_name);

                fs::write(&output_path, content)?;
                debug!("Wrote output to {}", output_path.display());
            }
            None => {
                println!("# {}", outcome.path.display());
                println!("{}", content);
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &outcomes)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = outcomes.iter().filter(|o| o.error.is_some()).collect();

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(outcomes.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for outcome in &failed {
            eprintln!(
                "  - {}: {}",
                outcome.path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Output file name for `path`, unique among the names already `taken`.
///
/// The input's stem is used when free. On a collision the full input file
/// name is kept (`a.md` becomes `a.md.json`), then a counter is appended.
fn output_file_name(path: &Path, extension: &str, taken: &mut HashSet<String>) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("report");
    let mut name = format!("{}.{}", stem, extension);

    if taken.contains(&name) {
        let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or(stem);
        name = format!("{}.{}", file_name, extension);

        let mut counter = 1;
        while taken.contains(&name) {
            name = format!("{}-{}.{}", file_name, counter, extension);
            counter += 1;
        }
        warn!(
            "Output name for {} collides with another input, writing {}",
            path.display(),
            name
        );
    }

    taken.insert(name.clone());
    name
}

fn write_summary(path: &Path, outcomes: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "patient_names",
        "dates_of_birth",
        "claim_ids",
        "processing_time_ms",
        "error",
    ])?;

    for outcome in outcomes {
        let filename = outcome
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let elapsed = outcome.processing_time_ms.to_string();

        match &outcome.result {
            Some(result) => wtr.write_record([
                filename,
                "success",
                &result.patient_names.len().to_string(),
                &result.dates_of_birth.len().to_string(),
                &result.claim_ids.len().to_string(),
                &elapsed,
                "",
            ])?,
            None => wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                &elapsed,
                outcome.error.as_deref().unwrap_or(""),
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
