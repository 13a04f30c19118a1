//! Configuration discovery and effective settings resolution.
//!
//! Vigil reads `vigil.toml|yaml|yml` from the working directory (or the
//! closest ancestor, stopping at a `.git` directory) and merges it with CLI
//! flags to produce an `Effective` config.
//! Defaults:
//! - `output`: `human`
//! - `level`, `confidence`: `low`
//! - `lines`: 1
//! - `progress`: 50
//! - `jobs`: 1
//! - `extensions`: `["py"]`
//! - `checks.include`: all built-in checks, `checks.exclude`: none
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::checks::builtin::CheckSelection;
use crate::error::ConfigError;
use crate::models::{Confidence, Severity};
use crate::progress::DEFAULT_BATCH;
use crate::scan::ScanOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_NAMES: [&str; 3] = ["vigil.toml", "vigil.yaml", "vigil.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
/// Test set selection under `[checks]`.
pub struct ChecksCfg {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
/// Root configuration loaded from `vigil.toml|yaml`.
pub struct VigilConfig {
    pub output: Option<String>,
    pub level: Option<String>,
    pub confidence: Option<String>,
    pub lines: Option<usize>,
    pub progress: Option<usize>,
    pub jobs: Option<usize>,
    pub debug: Option<bool>,
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub checks: Option<ChecksCfg>,
}

/// Values given on the command line; `None` falls through to the config file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub output: Option<String>,
    pub level: Option<String>,
    pub confidence: Option<String>,
    pub lines: Option<usize>,
    pub progress: Option<usize>,
    pub jobs: Option<usize>,
    pub debug: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub output: String,
    pub level: Severity,
    pub confidence: Confidence,
    pub lines: usize,
    pub progress: usize,
    pub jobs: usize,
    pub debug: bool,
    pub extensions: Vec<String>,
    pub selection: CheckSelection,
}

impl Effective {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            progress_batch: self.progress,
            jobs: self.jobs,
        }
    }
}

/// Walk upward from `start` to find the directory holding the config.
///
/// Stops when a `vigil.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// First config file present in `root`, if any.
pub fn find_config(root: &Path) -> Option<PathBuf> {
    CONFIG_NAMES
        .iter()
        .map(|n| root.join(n))
        .find(|p| p.is_file())
}

/// Load a config file; the format follows the extension.
pub fn load_config(path: &Path) -> Result<VigilConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed = if is_yaml {
        serde_yaml::from_str(&s).map_err(|e| e.to_string())
    } else {
        toml::from_str(&s).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(start: &Path, cli: &CliOverrides) -> Result<Effective, ConfigError> {
    let root = detect_root(start);
    let config_path = match cli.config.as_ref() {
        Some(p) => Some(p.clone()),
        None => find_config(&root),
    };
    let cfg = match config_path.as_ref() {
        Some(p) => load_config(p)?,
        None => VigilConfig::default(),
    };

    let output = cli
        .output
        .clone()
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    if output != "human" && output != "json" {
        return Err(ConfigError::InvalidValue {
            key: "output".into(),
            value: output,
        });
    }

    let level = match cli.level.as_deref().or(cfg.level.as_deref()) {
        Some(v) => parse_value::<Severity>("level", v)?,
        None => Severity::Low,
    };
    let confidence = match cli.confidence.as_deref().or(cfg.confidence.as_deref()) {
        Some(v) => parse_value::<Confidence>("confidence", v)?,
        None => Confidence::Low,
    };

    let lines = cli.lines.or(cfg.lines).unwrap_or(1);
    let progress = cli.progress.or(cfg.progress).unwrap_or(DEFAULT_BATCH);
    let jobs = cli.jobs.or(cfg.jobs).unwrap_or(1);
    if progress == 0 {
        return Err(ConfigError::InvalidBatchSize);
    }
    if jobs == 0 {
        return Err(ConfigError::InvalidJobs);
    }
    let debug = cli.debug || cfg.debug.unwrap_or(false);

    let extensions = cfg
        .extensions
        .unwrap_or_else(|| vec!["py".to_string()])
        .into_iter()
        .map(|e| e.trim_start_matches('.').to_string())
        .collect();

    // CLI lists replace the config lists rather than extending them
    let cfg_checks = cfg.checks.unwrap_or_default();
    let selection = CheckSelection {
        include: if cli.include.is_empty() {
            cfg_checks.include
        } else {
            cli.include.clone()
        },
        exclude: if cli.exclude.is_empty() {
            cfg_checks.exclude
        } else {
            cli.exclude.clone()
        },
    };

    Ok(Effective {
        root,
        config_path,
        output,
        level,
        confidence,
        lines,
        progress,
        jobs,
        debug,
        extensions,
        selection,
    })
}
