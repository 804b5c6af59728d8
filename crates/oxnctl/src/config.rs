use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use oxn_core::{ExtensionFilter, RunOptions, DEFAULT_EXTENSIONS};
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "oxn.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend_url: String,
    pub allowed_extensions: Vec<String>,
    pub runs: u32,
    pub output_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        let run = RunOptions::default();
        Self {
            backend_url: "http://127.0.0.1:8000".to_string(),
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            runs: run.runs,
            output_format: run.output_format,
        }
    }
}

/// Values given on the command line or through the environment.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub backend_url: Option<String>,
    pub runs: Option<u32>,
    pub output_format: Option<String>,
}

impl Settings {
    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let settings: Settings =
            toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(settings)
    }

    /// Defaults, then the explicit file or `oxn.toml` when present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load_from(&fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.backend_url {
            self.backend_url = url;
        }
        if let Some(runs) = overrides.runs {
            self.runs = runs;
        }
        if let Some(format) = overrides.output_format {
            self.output_format = format;
        }
        self
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            runs: self.runs,
            output_format: self.output_format.clone(),
        }
    }

    pub fn extension_filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(&self.allowed_extensions)
    }
}
