//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod extract;
pub mod models;

use std::path::{Path, PathBuf};

use tracing::debug;

use medex_core::{BackendKind, MedexConfig, NerConfig};

/// Load the configuration named on the command line, else the default
/// config file if it exists, else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<MedexConfig> {
    if let Some(path) = config_path {
        debug!("Loading config from {}", path);
        return Ok(MedexConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(MedexConfig::from_file(&default_path)?)
    } else {
        Ok(MedexConfig::default())
    }
}

/// Apply command-line NER overrides.
///
/// A config that keeps the default relative model directory is pointed at
/// the directory managed by `medex models`.
pub fn apply_ner_overrides(config: &mut MedexConfig, no_ner: bool, model_dir: Option<PathBuf>) {
    if no_ner {
        config.ner.backend = BackendKind::Disabled;
    }

    match model_dir {
        Some(dir) => config.ner.model_dir = dir,
        None if config.ner.model_dir == NerConfig::default().model_dir => {
            config.ner.model_dir = models::default_model_dir();
        }
        None => {}
    }
}
