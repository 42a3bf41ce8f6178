//! Runner configuration loaded from an optional TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::command::TracerPrefix;

/// Runner configuration (TOML).
///
/// Every field is optional in the file; missing fields take the defaults
/// below. Command-line flags describe *what* to run; this file describes
/// *where* artifacts go and *how* the tool wraps and watches children.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Directory where trace artifacts are written.
    pub artifact_dir: PathBuf,

    /// Keep at most this many bytes of each of stdout/stderr per run.
    pub output_limit_bytes: usize,

    /// How often to check for an interrupt while a child runs.
    pub poll_interval_ms: u64,

    pub call_trace: CallTraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CallTraceConfig {
    /// Tracer program and its arguments (e.g. `["strace","-f"]`).
    pub tracer: Vec<String>,
    /// Flag that names the tracer's log file.
    pub output_flag: String,
}

impl Default for CallTraceConfig {
    fn default() -> Self {
        Self {
            tracer: vec!["strace".to_string(), "-f".to_string()],
            output_flag: "-o".to_string(),
        }
    }
}

impl CallTraceConfig {
    pub fn prefix(&self) -> TracerPrefix {
        TracerPrefix {
            argv: self.tracer.clone(),
            output_flag: self.output_flag.clone(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("."),
            output_limit_bytes: 10 * 1024 * 1024,
            poll_interval_ms: 50,
            call_trace: CallTraceConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be > 0"));
        }
        if self.artifact_dir.as_os_str().is_empty() {
            return Err(anyhow!("artifact_dir must not be empty"));
        }
        if self.call_trace.tracer.is_empty() || self.call_trace.tracer[0].trim().is_empty() {
            return Err(anyhow!("call_trace.tracer must be a non-empty array"));
        }
        if self.call_trace.output_flag.trim().is_empty() {
            return Err(anyhow!("call_trace.output_flag must not be empty"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RunnerConfig::default()`.
pub fn load_config(path: &Path) -> Result<RunnerConfig> {
    if !path.exists() {
        let cfg = RunnerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RunnerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
