//! Extract command - extract patient information from a single report.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::{debug, info};

use medex_core::{ExtractionResult, PatientInfoExtractor, DEMO_DOCUMENT};

/// Arguments for extracting from one file.
#[derive(Args)]
pub struct ExtractArgs {
    /// Report text file (default: built-in demo report)
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Disable NER and use cue patterns for names
    #[arg(long)]
    no_ner: bool,

    /// NER model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text report
    Text,
    /// JSON output
    Json,
    /// CSV output, one row per extracted value
    Csv,
    /// XML output
    Xml,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Xml => "xml",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    super::apply_ner_overrides(&mut config, args.no_ner, args.model_dir.clone());

    let extractor = PatientInfoExtractor::new(&config)?;
    info!("Names will be extracted using {}", extractor.name_strategy());

    let result = match &args.input {
        Some(path) => {
            // An unreadable file yields an empty report, not an error
            info!("Processing file: {}", path.display());
            extractor.extract_file(path)
        }
        None => {
            info!("No input file given, using the demo report");
            extractor.extract(DEMO_DOCUMENT)
        }
    };

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(result.to_string()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Xml => format_xml(result),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["field", "value"])?;

    let fields = [
        ("patient_name", &result.patient_names),
        ("date_of_birth", &result.dates_of_birth),
        ("claim_id", &result.claim_ids),
    ];
    for (field, values) in fields {
        for value in values {
            wtr.write_record([field, value.as_str()])?;
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

#[derive(Serialize)]
#[serde(rename = "extraction")]
struct XmlReport<'a> {
    patient_names: XmlList<'a>,
    dates_of_birth: XmlList<'a>,
    claim_ids: XmlList<'a>,
}

#[derive(Serialize)]
struct XmlList<'a> {
    #[serde(rename = "item")]
    items: &'a [String],
}

fn format_xml(result: &ExtractionResult) -> anyhow::Result<String> {
    let report = XmlReport {
        patient_names: XmlList {
            items: &result.patient_names,
        },
        dates_of_birth: XmlList {
            items: &result.dates_of_birth,
        },
        claim_ids: XmlList {
            items: &result.claim_ids,
        },
    };

    Ok(quick_xml::se::to_string(&report)?)
}
