//! Error taxonomy shared by the inventory, sanitizer and commit sequencer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A single pseudo-file read or write failed. Never fatal on its own.
#[derive(Debug, Error)]
pub enum SysfsError {
    #[error("failed to read '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write '{value}' to '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        value: String,
        source: io::Error,
    },

    #[error("'{}' is empty", path.display())]
    Empty { path: PathBuf },
}

/// Discovery could not build a usable inventory.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("could not count processors in '{}': {source}", path.display())]
    CoreCountUnreadable { path: PathBuf, source: io::Error },

    #[error("no processor entries found in '{}'", path.display())]
    NoCores { path: PathBuf },
}

/// A value the set operation depends on could not be read or is out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InsaneSystemError {
    #[error("cpuinfo_min_freq is unavailable")]
    InfoMin,
    #[error("cpuinfo_max_freq is unavailable")]
    InfoMax,
    #[error("cpuinfo_min_freq ({min}) is not below cpuinfo_max_freq ({max})")]
    InfoRange { min: u32, max: u32 },
    #[error("scaling_min_freq is unavailable")]
    CurrentMin,
    #[error("scaling_max_freq is unavailable")]
    CurrentMax,
    #[error("scaling_governor is unavailable")]
    Governor,
}

/// Every write of a commit failed.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("none of the {attempted} writes succeeded")]
    NothingWritten { attempted: usize },
}

/// The user asked for something that cannot be turned into a set operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("no values were requested")]
    Empty,
    #[error("unknown plan '{0}'")]
    UnknownPlan(String),
    #[error("'{value}' is not a valid frequency (expected kHz or a percentage such as 80%)")]
    BadFrequency { value: String },
    #[error("governor '{requested}' is not one of: {available}")]
    UnknownGovernor { requested: String, available: String },
}

/// Top-level failure of a get or set run; each variant maps to a non-zero exit.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not init CPU: {0}")]
    Init(#[from] InitError),
    #[error("system is insane: {0}")]
    Insane(#[from] InsaneSystemError),
    #[error("insufficient permissions, setting values requires root")]
    Permission,
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("could not set any values: {0}")]
    Commit(#[from] CommitError),
}
