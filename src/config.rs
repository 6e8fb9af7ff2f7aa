//! pstate-frequency configuration (htoprc-style key=value format)
//!
//! Read from `$PSTATE_FREQUENCY_CONFIG`, falling back to
//! `/etc/pstate-frequency/pstate-frequencyrc`. Never written by the program.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::color_scheme::ColorSchemeId;
use crate::system::cpu::PROC_CPUINFO;
use crate::system::sysfs::SYSFS_CPU_ROOT;
use crate::tuning::commit::{CommitStrategy, DEFAULT_SETTLE};

const CONFIG_ENV: &str = "PSTATE_FREQUENCY_CONFIG";
const SYSTEM_CONFIG: &str = "/etc/pstate-frequency/pstate-frequencyrc";

/// Get the config file path: $PSTATE_FREQUENCY_CONFIG or the system-wide file
fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(SYSTEM_CONFIG))
}

/// Settings that are not per-invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsfreqConfig {
    // Locations
    pub sysfs_root: PathBuf,
    pub cpuinfo_path: PathBuf,

    // Commit
    pub two_phase: bool,
    pub settle_ms: u64,

    // Output
    pub color: bool,
    pub color_scheme_id: ColorSchemeId,
}

impl Default for PsfreqConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(SYSFS_CPU_ROOT),
            cpuinfo_path: PathBuf::from(PROC_CPUINFO),
            two_phase: true,
            settle_ms: DEFAULT_SETTLE.as_millis() as u64,
            color: false,
            color_scheme_id: ColorSchemeId::Default,
        }
    }
}

impl PsfreqConfig {
    /// Load config from `path` (or the default location), returning defaults if it doesn't exist
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!(path = %path.display(), "loaded config");
                Self::parse(&content)
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no config, using defaults");
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Self {
        let mut cfg = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();
                match key {
                    "sysfs_root" if !value.is_empty() => cfg.sysfs_root = PathBuf::from(value),
                    "cpuinfo_path" if !value.is_empty() => cfg.cpuinfo_path = PathBuf::from(value),
                    "two_phase" => cfg.two_phase = value == "1",
                    "settle_ms" => {
                        if let Ok(v) = value.parse::<u64>() {
                            cfg.settle_ms = v.min(10000);
                        }
                    }
                    "color" => cfg.color = value == "1",
                    "color_scheme" => {
                        if let Ok(idx) = value.parse::<usize>() {
                            cfg.color_scheme_id = ColorSchemeId::from_index(idx);
                        }
                    }
                    _ => {} // Ignore unknown keys
                }
            }
        }

        cfg
    }

    /// Commit strategy described by this config; a zero pause means no sleep
    pub fn strategy(&self) -> CommitStrategy {
        if !self.two_phase {
            return CommitStrategy::Direct;
        }
        let settle = (self.settle_ms > 0).then(|| Duration::from_millis(self.settle_ms));
        CommitStrategy::TwoPhase { settle }
    }
}
