//! Models command - download and manage the NER model.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use futures_util::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use medex_core::{load_backend, NerConfig};

const DEFAULT_BASE_URL: &str = "https://huggingface.co/Xenova/bert-base-NER/resolve/main";

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List the model artifacts
    List,

    /// Download the model artifacts
    Download(DownloadArgs),

    /// Check model status
    Status(StatusArgs),

    /// Remove downloaded models
    Clean(DirArgs),
}

#[derive(Args)]
struct DownloadArgs {
    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force re-download even if files exist
    #[arg(long)]
    force: bool,

    /// Base URL the artifacts are fetched from
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[derive(Args)]
struct StatusArgs {
    #[command(flatten)]
    dir: DirArgs,

    /// Also try loading the model
    #[arg(long)]
    load: bool,
}

#[derive(Args)]
struct DirArgs {
    /// Model directory
    #[arg(short, long)]
    dir: Option<PathBuf>,
}

/// A file making up the NER model.
struct Artifact {
    filename: &'static str,
    remote_path: &'static str,
    size_bytes: u64,
    description: &'static str,
}

const ARTIFACTS: &[Artifact] = &[
    Artifact {
        filename: "model.onnx",
        remote_path: "onnx/model.onnx",
        size_bytes: 431_000_000,
        description: "BERT token classifier (CoNLL-03 NER)",
    },
    Artifact {
        filename: "tokenizer.json",
        remote_path: "tokenizer.json",
        size_bytes: 670_000,
        description: "WordPiece tokenizer",
    },
    Artifact {
        filename: "config.json",
        remote_path: "config.json",
        size_bytes: 900,
        description: "Label table (id2label)",
    },
];

/// Directory managed by `medex models`.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("medex")
        .join("models")
        .join("ner")
}

pub async fn run(args: ModelsArgs) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::List => list_models(),
        ModelsCommand::Download(download_args) => download_models(download_args).await,
        ModelsCommand::Status(status_args) => check_status(status_args),
        ModelsCommand::Clean(dir_args) => clean_models(dir_args),
    }
}

fn list_models() -> anyhow::Result<()> {
    println!("{}", style("NER Model Artifacts").bold());
    println!();

    let total_size: u64 = ARTIFACTS.iter().map(|a| a.size_bytes).sum();
    println!(
        "{} {} {}",
        style("▸ bert-base-NER").bold().cyan(),
        format_size(total_size),
        style(format!("- {}", DEFAULT_BASE_URL)).dim()
    );

    for artifact in ARTIFACTS {
        println!(
            "    {:<20} {:>10}  {}",
            artifact.filename,
            format_size(artifact.size_bytes),
            artifact.description
        );
    }

    println!();
    println!("Commands:");
    println!("  medex models download    Download the model to {}", default_model_dir().display());
    println!("  medex models status      Check which artifacts are present");

    Ok(())
}

async fn download_models(args: DownloadArgs) -> anyhow::Result<()> {
    let output_dir = args.output.unwrap_or_else(default_model_dir);
    fs::create_dir_all(&output_dir)?;

    println!(
        "{} Downloading NER model to {}",
        style("ℹ").blue(),
        output_dir.display()
    );
    println!();

    let client = reqwest::Client::builder()
        .user_agent(concat!("medex-cli/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(600))
        .build()?;

    let multi_progress = MultiProgress::new();
    let mut success_count = 0;
    let mut skip_count = 0;
    let mut error_count = 0;

    let base_url = args.base_url.trim_end_matches('/');

    for artifact in ARTIFACTS {
        let path = output_dir.join(artifact.filename);

        if path.exists() && !args.force {
            let metadata = fs::metadata(&path)?;
            if metadata.len() > artifact.size_bytes / 2 {
                println!(
                    "  {} {} (already exists, {})",
                    style("✓").green(),
                    artifact.filename,
                    format_size(metadata.len())
                );
                skip_count += 1;
                continue;
            }
        }

        let url = format!("{}/{}", base_url, artifact.remote_path);

        let pb = multi_progress.add(ProgressBar::new(artifact.size_bytes));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} {msg:<30} [{bar:25.cyan/blue}] {bytes}/{total_bytes}")?
                .progress_chars("=>-"),
        );
        pb.set_message(artifact.filename.to_string());

        match download_file(&client, &url, &path, &pb).await {
            Ok(()) => {
                pb.finish_with_message(format!("{} {}", style("✓").green(), artifact.filename));
                success_count += 1;
            }
            Err(e) => {
                pb.finish_with_message(format!(
                    "{} {} - {}",
                    style("✗").red(),
                    artifact.filename,
                    e
                ));
                error_count += 1;
            }
        }
    }

    println!();

    if error_count == 0 {
        println!("{} NER model downloaded successfully!", style("✓").green().bold());
        if skip_count > 0 {
            println!("   {} downloaded, {} already present", success_count, skip_count);
        }
    } else {
        println!("{} Download completed with errors", style("⚠").yellow().bold());
        println!(
            "   {} downloaded, {} skipped, {} failed",
            success_count, skip_count, error_count
        );
        println!();
        println!("Retry with: medex models download --force");
    }

    println!();
    print_status(&output_dir)?;

    if error_count > 0 {
        anyhow::bail!("{} artifacts failed to download", error_count);
    }

    Ok(())
}

async fn download_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    pb: &ProgressBar,
) -> anyhow::Result<()> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }

    if let Some(content_length) = response.content_length() {
        pb.set_length(content_length);
    }

    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    Ok(())
}

fn check_status(args: StatusArgs) -> anyhow::Result<()> {
    let model_dir = args.dir.dir.unwrap_or_else(default_model_dir);
    let ready = print_status(&model_dir)?;

    if args.load && ready {
        let config = NerConfig {
            model_dir,
            ..NerConfig::default()
        };
        match load_backend(&config).backend() {
            Some(backend) => println!(
                "    {} Loaded with {} backend",
                style("✓").green(),
                backend.backend_id()
            ),
            None => println!("    {} Model present but failed to load", style("✗").red()),
        }
    }

    Ok(())
}

/// Print per-artifact status; returns whether every artifact is present.
fn print_status(model_dir: &Path) -> anyhow::Result<bool> {
    println!("{}", style("Model Status").bold());
    println!("{} {}", style("▸ bert-base-NER").bold(), model_dir.display());

    let mut all_present = true;
    let mut total_size: u64 = 0;

    for artifact in ARTIFACTS {
        let path = model_dir.join(artifact.filename);
        let (status, size_str) = if path.exists() {
            let size = fs::metadata(&path)?.len();
            total_size += size;

            if size > artifact.size_bytes / 2 {
                (style("✓").green(), format_size(size))
            } else {
                all_present = false;
                (
                    style("⚠").yellow(),
                    format!("{} (incomplete?)", format_size(size)),
                )
            }
        } else {
            all_present = false;
            (style("✗").red(), "missing".to_string())
        };

        println!("    {} {:<25} {:>10}", status, artifact.filename, size_str);
    }

    if all_present {
        println!(
            "    {} Ready ({} total)",
            style("✓").green(),
            format_size(total_size)
        );
    } else {
        println!(
            "    {} Run 'medex models download' to download",
            style("⚠").yellow()
        );
    }

    Ok(all_present)
}

fn clean_models(args: DirArgs) -> anyhow::Result<()> {
    let model_dir = args.dir.unwrap_or_else(default_model_dir);

    let mut total_removed = 0;
    let mut total_freed: u64 = 0;

    for artifact in ARTIFACTS {
        let path = model_dir.join(artifact.filename);
        if path.exists() {
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            fs::remove_file(&path)?;
            total_removed += 1;
            total_freed += size;
            println!("  {} Removed {}", style("✓").green(), artifact.filename);
        }
    }

    if let Ok(entries) = fs::read_dir(&model_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "tmp") {
                let _ = fs::remove_file(&path);
            }
        }
    }

    if total_removed > 0 {
        println!();
        println!(
            "{} Removed {} files, freed {}",
            style("✓").green(),
            total_removed,
            format_size(total_freed)
        );
    } else {
        println!("{} No model files to remove.", style("ℹ").blue());
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1}GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1}MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1}KB", bytes as f64 / 1_000.0)
    } else {
        format!("{}B", bytes)
    }
}
