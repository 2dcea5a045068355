//! CLI settings, read from an optional YAML file.

use amortization_core::schedule::DEFAULT_MAX_INCOME_COMMITMENT;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "AMORT_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Filter level for the core and CLI crates, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    /// Directory backing the preset store
    #[serde(default = "default_presets_dir")]
    pub presets_dir: PathBuf,

    /// Share of gross income a first payment may take before warning
    #[serde(default = "default_max_income_commitment")]
    pub max_income_commitment: Decimal,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_presets_dir() -> PathBuf {
    PathBuf::from(".amort")
}

fn default_max_income_commitment() -> Decimal {
    DEFAULT_MAX_INCOME_COMMITMENT
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            presets_dir: default_presets_dir(),
            max_income_commitment: default_max_income_commitment(),
        }
    }
}

impl Settings {
    /// Load from `explicit`, else `$AMORT_CONFIG`, else defaults.
    ///
    /// A path that does not exist yields defaults; a file that exists but
    /// does not parse is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        match path {
            Some(p) if p.is_file() => {
                let contents = fs::read_to_string(&p)
                    .map_err(|e| format!("Failed to read '{}': {}", p.display(), e))?;
                Self::from_yaml(&contents)
                    .map_err(|e| format!("Failed to parse '{}': {}", p.display(), e).into())
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }
}
