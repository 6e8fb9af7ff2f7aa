//! Writes sanitized values to every core in an order the driver accepts.
//!
//! intel_pstate only re-evaluates its percentage limits when a written value
//! changes, so by default every commit first widens the bounds to the full
//! hardware range (the sane phase) and then writes the real bounds.

use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{CommitError, SysfsError};
use crate::system::cpu::CpuInventory;
use crate::system::sysfs::Accessor;
use crate::tuning::sanitize::SanitizedValues;

/// Pause between the sane and the real phase unless disabled.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStrategy {
    /// Sane phase, optional settle pause, then the real bounds.
    TwoPhase { settle: Option<Duration> },
    /// Real bounds only, for drivers that notice every write.
    Direct,
}

impl Default for CommitStrategy {
    fn default() -> Self {
        CommitStrategy::TwoPhase {
            settle: Some(DEFAULT_SETTLE),
        }
    }
}

/// Outcome of a commit that wrote at least one value.
#[derive(Debug, Default)]
pub struct CommitReport {
    pub attempted: usize,
    pub failures: Vec<SysfsError>,
}

impl CommitReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    fn record(&mut self, result: Result<(), SysfsError>) {
        self.attempted += 1;
        if let Err(e) = result {
            warn!("{}, continuing", e);
            self.failures.push(e);
        }
    }
}

pub struct CommitSequencer<'a, A: Accessor> {
    sysfs: &'a A,
    strategy: CommitStrategy,
}

impl<'a, A: Accessor> CommitSequencer<'a, A> {
    pub fn new(sysfs: &'a A, strategy: CommitStrategy) -> Self {
        Self { sysfs, strategy }
    }

    /// Apply `values` to every core. Individual write failures are collected;
    /// only a commit where nothing succeeded is an error.
    pub fn apply(
        &self,
        cpu: &CpuInventory,
        values: &SanitizedValues,
    ) -> Result<CommitReport, CommitError> {
        let mut report = CommitReport::default();

        if let CommitStrategy::TwoPhase { settle } = self.strategy {
            debug!(
                sane_min = values.sane_min,
                sane_max = values.sane_max,
                "setting sane min/max values"
            );
            self.write_all(&mut report, cpu.scaling_min_paths(), values.sane_min);
            self.write_all(&mut report, cpu.scaling_max_paths(), values.sane_max);
            if let Some(pause) = settle {
                debug!(?pause, "letting the driver settle");
                thread::sleep(pause);
            }
        }

        if values.current_min > values.max {
            debug!("current min is above the new max, setting min first");
            self.write_all(&mut report, cpu.scaling_min_paths(), values.min);
            self.write_all(&mut report, cpu.scaling_max_paths(), values.max);
        } else {
            debug!("current min is below the new max, setting max first");
            self.write_all(&mut report, cpu.scaling_max_paths(), values.max);
            self.write_all(&mut report, cpu.scaling_min_paths(), values.min);
        }

        if let (Some(control), Some(turbo)) = (&cpu.turbo, values.turbo) {
            debug!(turbo, "turbo is available");
            let result = self.sysfs.write(&control.path, &turbo.to_string());
            report.record(result);
        }

        debug!(governor = %values.governor, "set the cpu governor");
        for path in cpu.governor_paths() {
            let result = self.sysfs.write(path, &values.governor);
            report.record(result);
        }

        if report.succeeded() == 0 {
            return Err(CommitError::NothingWritten {
                attempted: report.attempted,
            });
        }
        info!(
            attempted = report.attempted,
            failed = report.failures.len(),
            "commit finished"
        );
        Ok(report)
    }

    fn write_all<'p>(
        &self,
        report: &mut CommitReport,
        paths: impl Iterator<Item = &'p Path>,
        value: u32,
    ) {
        let value = value.to_string();
        for path in paths {
            report.record(self.sysfs.write(path, &value));
        }
    }
}
