use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::error::InitError;
use crate::system::sysfs::{count_processors, Accessor};

/// Default process-information file used to count logical cores.
pub const PROC_CPUINFO: &str = "/proc/cpuinfo";

const PSTATE_DRIVER: &str = "intel_pstate";

/// How the driver exposes turbo boost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurboPolarity {
    /// `intel_pstate/no_turbo`: 1 disables turbo
    NoTurbo,
    /// `cpufreq/boost`: 1 enables turbo
    Boost,
}

impl TurboPolarity {
    /// Raw file value for the requested turbo state.
    pub fn raw(self, enabled: bool) -> u8 {
        match (self, enabled) {
            (TurboPolarity::NoTurbo, true) | (TurboPolarity::Boost, false) => 0,
            (TurboPolarity::NoTurbo, false) | (TurboPolarity::Boost, true) => 1,
        }
    }

    /// Whether a raw file value means turbo is on.
    pub fn is_enabled(self, raw: u8) -> bool {
        match self {
            TurboPolarity::NoTurbo => raw == 0,
            TurboPolarity::Boost => raw != 0,
        }
    }
}

/// Location and meaning of the turbo control file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurboControl {
    pub path: PathBuf,
    pub polarity: TurboPolarity,
}

/// Paths of one logical core's cpufreq attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorePaths {
    pub id: usize,
    pub scaling_min: PathBuf,
    pub scaling_max: PathBuf,
    pub governor: PathBuf,
    pub cur_freq: PathBuf,
}

impl CorePaths {
    fn new(id: usize) -> Self {
        let base = PathBuf::from(format!("cpu{}/cpufreq", id));
        Self {
            id,
            scaling_min: base.join("scaling_min_freq"),
            scaling_max: base.join("scaling_max_freq"),
            governor: base.join("scaling_governor"),
            cur_freq: base.join("scaling_cur_freq"),
        }
    }
}

/// Everything probed once at startup. Frequencies are in kHz.
///
/// Only the paths are fixed; the values behind them are live and are read
/// again by the sanitizer and the report.
#[derive(Debug, Clone)]
pub struct CpuInventory {
    pub has_pstate: bool,
    pub driver: Option<String>,
    pub info_min: Option<u32>,
    pub info_max: Option<u32>,
    pub turbo: Option<TurboControl>,
    cores: Vec<CorePaths>,
}

impl CpuInventory {
    /// Probe the process-information file and the cpufreq tree behind `sysfs`.
    pub fn discover(sysfs: &impl Accessor, cpuinfo: &Path) -> Result<Self, InitError> {
        let cpu_num = count_processors(cpuinfo).map_err(|source| {
            error!(path = %cpuinfo.display(), %source, "failed to find number of cpus");
            InitError::CoreCountUnreadable {
                path: cpuinfo.to_path_buf(),
                source,
            }
        })?;
        debug!(cpu_num, "number of cpus");
        if cpu_num == 0 {
            error!(path = %cpuinfo.display(), "no processors listed");
            return Err(InitError::NoCores {
                path: cpuinfo.to_path_buf(),
            });
        }

        let driver = sysfs.read(Path::new("cpu0/cpufreq/scaling_driver")).ok();
        if driver.is_none() {
            warn!("unable to check for intel_pstate driver");
        }
        let has_pstate = driver.as_deref() == Some(PSTATE_DRIVER);
        debug!(?driver, has_pstate, "scaling driver");

        let info_max = sysfs.read_u32(Path::new("cpu0/cpufreq/cpuinfo_max_freq"));
        let info_min = sysfs.read_u32(Path::new("cpu0/cpufreq/cpuinfo_min_freq"));
        if info_max.is_none() || info_min.is_none() {
            warn!(?info_min, ?info_max, "hardware frequency bounds unavailable");
        }

        let turbo = probe_turbo(sysfs, has_pstate);
        let cores: Vec<CorePaths> = (0..cpu_num).map(CorePaths::new).collect();

        Ok(Self {
            has_pstate,
            driver,
            info_min,
            info_max,
            turbo,
            cores,
        })
    }

    /// Build an inventory from known values, bypassing discovery.
    pub fn from_parts(
        cpu_num: usize,
        has_pstate: bool,
        info_min: Option<u32>,
        info_max: Option<u32>,
        turbo: Option<TurboControl>,
    ) -> Result<Self, InitError> {
        if cpu_num == 0 {
            return Err(InitError::NoCores {
                path: PathBuf::new(),
            });
        }
        Ok(Self {
            has_pstate,
            driver: has_pstate.then(|| PSTATE_DRIVER.to_string()),
            info_min,
            info_max,
            turbo,
            cores: (0..cpu_num).map(CorePaths::new).collect(),
        })
    }

    pub fn cpu_num(&self) -> usize {
        self.cores.len()
    }

    pub fn cores(&self) -> &[CorePaths] {
        &self.cores
    }

    pub fn scaling_min_paths(&self) -> impl Iterator<Item = &Path> {
        self.cores.iter().map(|c| c.scaling_min.as_path())
    }

    pub fn scaling_max_paths(&self) -> impl Iterator<Item = &Path> {
        self.cores.iter().map(|c| c.scaling_max.as_path())
    }

    pub fn governor_paths(&self) -> impl Iterator<Item = &Path> {
        self.cores.iter().map(|c| c.governor.as_path())
    }

    /// Governors core 0 accepts, if the driver lists them.
    pub fn available_governors(&self, sysfs: &impl Accessor) -> Option<Vec<String>> {
        sysfs
            .read(Path::new("cpu0/cpufreq/scaling_available_governors"))
            .ok()
            .map(|line| line.split_whitespace().map(str::to_string).collect())
    }
}

/// intel_pstate keeps its own switch; everything else uses the generic boost file.
fn probe_turbo(sysfs: &impl Accessor, has_pstate: bool) -> Option<TurboControl> {
    let control = if has_pstate {
        TurboControl {
            path: PathBuf::from("intel_pstate/no_turbo"),
            polarity: TurboPolarity::NoTurbo,
        }
    } else {
        TurboControl {
            path: PathBuf::from("cpufreq/boost"),
            polarity: TurboPolarity::Boost,
        }
    };

    match sysfs.read_u32(&control.path) {
        Some(_) => Some(control),
        None => {
            debug!(path = %control.path.display(), "turbo boost not supported");
            None
        }
    }
}
