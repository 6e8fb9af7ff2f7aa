//! Single-value access to the cpufreq pseudo-file tree.
//!
//! Every file under `/sys/devices/system/cpu` holds one value on one line.
//! Paths handed to an [`Accessor`] are relative to its root, e.g.
//! `cpu0/cpufreq/scaling_driver`.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SysfsError;

/// Default mount point of the per-core cpufreq subtrees.
pub const SYSFS_CPU_ROOT: &str = "/sys/devices/system/cpu";

/// Read/write primitive used by discovery, commit and reporting.
///
/// Failures are returned, not escalated: many files are optional and only
/// the caller knows whether a missing one matters.
pub trait Accessor {
    /// Read the first line of `path`, trailing whitespace stripped.
    fn read(&self, path: &Path) -> Result<String, SysfsError>;

    /// Truncate `path` and write `value` followed by a newline.
    fn write(&self, path: &Path, value: &str) -> Result<(), SysfsError>;

    /// Read and parse a numeric value. Unreadable or non-numeric gives `None`.
    fn read_u32(&self, path: &Path) -> Option<u32> {
        let line = self.read(path).ok()?;
        match line.trim().parse::<u32>() {
            Ok(v) => Some(v),
            Err(_) => {
                debug!(path = %path.display(), value = %line, "not a number");
                None
            }
        }
    }
}

/// The live tree (or any directory laid out like it).
#[derive(Debug, Clone)]
pub struct SysfsTree {
    root: PathBuf,
}

impl SysfsTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl Default for SysfsTree {
    fn default() -> Self {
        Self::new(SYSFS_CPU_ROOT)
    }
}

impl Accessor for SysfsTree {
    fn read(&self, path: &Path) -> Result<String, SysfsError> {
        let abs = self.resolve(path);
        debug!(path = %abs.display(), "read");

        let file = File::open(&abs).map_err(|source| {
            debug!(path = %abs.display(), %source, "open for reading failed");
            SysfsError::Read { path: abs.clone(), source }
        })?;

        let mut line = String::new();
        let n = BufReader::new(file).read_line(&mut line).map_err(|source| {
            debug!(path = %abs.display(), %source, "read failed");
            SysfsError::Read { path: abs.clone(), source }
        })?;
        if n == 0 {
            debug!(path = %abs.display(), "file is empty");
            return Err(SysfsError::Empty { path: abs });
        }

        Ok(line.trim_end().to_string())
    }

    fn write(&self, path: &Path, value: &str) -> Result<(), SysfsError> {
        let abs = self.resolve(path);
        debug!(path = %abs.display(), value, "write");

        let to_err = |source| SysfsError::Write {
            path: abs.clone(),
            value: value.to_string(),
            source,
        };

        // attributes are never created, a missing one is an error
        let result = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&abs)
            .and_then(|mut f| writeln!(f, "{}", value));
        result.map_err(|source| {
            debug!(path = %abs.display(), value, %source, "write failed");
            to_err(source)
        })
    }
}

/// Count `processor` entries in a `/proc/cpuinfo`-formatted file.
pub fn count_processors(cpuinfo: &Path) -> std::io::Result<usize> {
    let content = fs::read_to_string(cpuinfo)?;
    Ok(content
        .lines()
        .filter(|line| {
            line.split(':')
                .next()
                .is_some_and(|key| key.trim() == "processor")
        })
        .count())
}
