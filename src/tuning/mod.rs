pub mod commit;
pub mod plan;
pub mod sanitize;

use tracing::debug;

use crate::error::{Error, RequestError};
use crate::system::collector::Collector;
use crate::system::cpu::CpuInventory;
use crate::system::sysfs::Accessor;
use commit::{CommitReport, CommitSequencer, CommitStrategy};
use sanitize::{Baseline, RequestedValues, SanitizedValues};

/// What a successful set wrote.
#[derive(Debug)]
pub struct SetOutcome {
    pub values: SanitizedValues,
    pub report: CommitReport,
}

/// Fail unless the effective user may write cpufreq attributes.
pub fn ensure_root() -> Result<(), Error> {
    if nix::unistd::geteuid().is_root() {
        Ok(())
    } else {
        Err(Error::Permission)
    }
}

/// Validate, sanitize and commit `requested` on every core.
pub fn set<A: Accessor>(
    sysfs: &A,
    cpu: &CpuInventory,
    requested: &RequestedValues,
    strategy: CommitStrategy,
) -> Result<SetOutcome, Error> {
    if requested.is_empty() {
        return Err(RequestError::Empty.into());
    }
    if let Some(governor) = &requested.governor {
        check_governor(sysfs, cpu, governor)?;
    }

    let snapshot = Collector::new(sysfs, cpu).snapshot();
    let baseline = Baseline::new(cpu, &snapshot)?;
    let values = sanitize::compute(&baseline, requested);
    debug!(?values, "sanitized values");

    let strategy = effective_strategy(strategy, requested.sleep);
    let report = CommitSequencer::new(sysfs, strategy).apply(cpu, &values)?;
    Ok(SetOutcome { values, report })
}

/// `--no-sleep` keeps the sane phase but drops the pause after it.
fn effective_strategy(strategy: CommitStrategy, sleep: bool) -> CommitStrategy {
    match strategy {
        CommitStrategy::TwoPhase { .. } if !sleep => CommitStrategy::TwoPhase { settle: None },
        other => other,
    }
}

/// Governors are only checked when the driver publishes the list.
fn check_governor<A: Accessor>(
    sysfs: &A,
    cpu: &CpuInventory,
    governor: &str,
) -> Result<(), RequestError> {
    match cpu.available_governors(sysfs) {
        Some(available) if !available.iter().any(|g| g == governor) => {
            Err(RequestError::UnknownGovernor {
                requested: governor.to_string(),
                available: available.join(", "),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use super::*;
    use crate::error::InsaneSystemError;
    use crate::logging::tests::captured;
    use crate::logging::Verbosity;
    use crate::system::cpu::tests::fake_system;
    use crate::system::sysfs::SysfsTree;
    use plan::Plan;
    use sanitize::FreqRequest;

    fn read(dir: &tempfile::TempDir, rel: &str) -> String {
        fs::read_to_string(dir.path().join("cpu").join(rel))
            .unwrap()
            .trim()
            .to_string()
    }

    #[test]
    fn set_writes_every_core_of_a_fake_tree() {
        let dir = fake_system(2, "intel_pstate", Some("0"));
        fs::write(dir.path().join("cpu/cpu0/cpufreq/scaling_min_freq"), "1600000\n").unwrap();
        let tree = SysfsTree::new(dir.path().join("cpu"));
        let cpu = CpuInventory::discover(&tree, &dir.path().join("cpuinfo")).unwrap();

        let requested = RequestedValues {
            max: Some(FreqRequest::Khz(1000000)),
            turbo: Some(1),
            governor: Some("performance".into()),
            sleep: false,
            ..Default::default()
        };
        let outcome = set(&tree, &cpu, &requested, CommitStrategy::default()).unwrap();

        assert_eq!((outcome.values.min, outcome.values.max), (999999, 1000000));
        for core in 0..2 {
            assert_eq!(read(&dir, &format!("cpu{}/cpufreq/scaling_min_freq", core)), "999999");
            assert_eq!(read(&dir, &format!("cpu{}/cpufreq/scaling_max_freq", core)), "1000000");
            assert_eq!(read(&dir, &format!("cpu{}/cpufreq/scaling_governor", core)), "performance");
        }
        assert_eq!(read(&dir, "intel_pstate/no_turbo"), "1");
        assert!(!outcome.report.is_partial());
    }

    #[test]
    fn no_sleep_drops_only_the_pause() {
        let settle = Some(Duration::from_millis(500));
        assert_eq!(
            effective_strategy(CommitStrategy::TwoPhase { settle }, false),
            CommitStrategy::TwoPhase { settle: None }
        );
        assert_eq!(
            effective_strategy(CommitStrategy::TwoPhase { settle }, true),
            CommitStrategy::TwoPhase { settle }
        );
        assert_eq!(effective_strategy(CommitStrategy::Direct, false), CommitStrategy::Direct);
    }

    #[test]
    fn plan_on_a_plain_system_logs_nothing() {
        let dir = fake_system(2, "acpi-cpufreq", None);
        fs::remove_file(dir.path().join("cpu/cpu0/cpufreq/scaling_available_governors")).unwrap();
        let tree = SysfsTree::new(dir.path().join("cpu"));
        let cpu = CpuInventory::discover(&tree, &dir.path().join("cpuinfo")).unwrap();

        let requested = RequestedValues {
            sleep: false,
            ..Plan::Powersave.requested(&cpu)
        };
        let (outcome, logged) = captured(Verbosity::Normal, false, || {
            set(&tree, &cpu, &requested, CommitStrategy::default()).unwrap()
        });
        assert!(!outcome.report.is_partial());
        assert!(logged.is_empty(), "unexpected log output: {}", logged);
    }

    #[test]
    fn empty_request_is_rejected() {
        let dir = fake_system(1, "intel_pstate", None);
        let tree = SysfsTree::new(dir.path().join("cpu"));
        let cpu = CpuInventory::discover(&tree, &dir.path().join("cpuinfo")).unwrap();

        let err = set(&tree, &cpu, &RequestedValues::default(), CommitStrategy::Direct).unwrap_err();
        assert!(matches!(err, Error::Request(RequestError::Empty)));
    }

    #[test]
    fn unknown_governor_is_rejected_before_writing() {
        let dir = fake_system(1, "intel_pstate", None);
        let tree = SysfsTree::new(dir.path().join("cpu"));
        let cpu = CpuInventory::discover(&tree, &dir.path().join("cpuinfo")).unwrap();

        let requested = RequestedValues {
            governor: Some("ondemand".into()),
            ..Default::default()
        };
        let err = set(&tree, &cpu, &requested, CommitStrategy::Direct).unwrap_err();
        assert!(matches!(
            err,
            Error::Request(RequestError::UnknownGovernor { .. })
        ));
        assert_eq!(read(&dir, "cpu0/cpufreq/scaling_governor"), "powersave");
    }

    #[test]
    fn insane_system_writes_nothing() {
        let dir = fake_system(1, "intel_pstate", None);
        fs::write(dir.path().join("cpu/cpu0/cpufreq/cpuinfo_min_freq"), "0\n").unwrap();
        let tree = SysfsTree::new(dir.path().join("cpu"));
        let cpu = CpuInventory::discover(&tree, &dir.path().join("cpuinfo")).unwrap();

        let requested = RequestedValues {
            max: Some(FreqRequest::Percent(50)),
            ..Default::default()
        };
        let err = set(&tree, &cpu, &requested, CommitStrategy::Direct).unwrap_err();
        assert!(matches!(err, Error::Insane(InsaneSystemError::InfoMin)));
        assert_eq!(read(&dir, "cpu0/cpufreq/scaling_max_freq"), "3400000");
    }
}
