use sysinfo::{CpuRefreshKind, RefreshKind, System};
use tracing::debug;

use crate::system::cpu::CpuInventory;
use crate::system::sysfs::Accessor;

/// Per-core scaling state as read back from sysfs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreState {
    pub id: usize,
    pub scaling_min: Option<u32>, // kHz
    pub scaling_max: Option<u32>, // kHz
    pub governor: Option<String>,
}

/// Instantaneous per-core frequency, distinct from the scaling target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreFrequency {
    pub id: usize,
    pub cur_freq: Option<u32>, // kHz
}

/// What a get operation displays
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuSnapshot {
    pub driver: Option<String>,
    pub info_min: Option<u32>,
    pub info_max: Option<u32>,
    pub turbo: Option<u8>, // raw file value
    pub cores: Vec<CoreState>,
}

impl CpuSnapshot {
    /// Core 0 stands in for the whole package when deciding new values.
    pub fn first(&self) -> Option<&CoreState> {
        self.cores.first()
    }
}

/// Reads the live values named by an inventory. Never writes.
pub struct Collector<'a, A: Accessor> {
    sysfs: &'a A,
    cpu: &'a CpuInventory,
}

impl<'a, A: Accessor> Collector<'a, A> {
    pub fn new(sysfs: &'a A, cpu: &'a CpuInventory) -> Self {
        Self { sysfs, cpu }
    }

    /// Read min/max/governor for every core plus turbo.
    pub fn snapshot(&self) -> CpuSnapshot {
        let cores = self
            .cpu
            .cores()
            .iter()
            .map(|core| CoreState {
                id: core.id,
                scaling_min: self.sysfs.read_u32(&core.scaling_min),
                scaling_max: self.sysfs.read_u32(&core.scaling_max),
                governor: self.sysfs.read(&core.governor).ok(),
            })
            .collect();

        let turbo = self.turbo();
        debug!(?turbo, "collected scaling state");

        CpuSnapshot {
            driver: self.cpu.driver.clone(),
            info_min: self.cpu.info_min,
            info_max: self.cpu.info_max,
            turbo,
            cores,
        }
    }

    /// Raw turbo value, `None` when the system has no turbo control.
    pub fn turbo(&self) -> Option<u8> {
        let control = self.cpu.turbo.as_ref()?;
        self.sysfs
            .read_u32(&control.path)
            .map(|v| v.min(u8::MAX as u32) as u8)
    }

    /// Read `scaling_cur_freq` for every core.
    pub fn realtime(&self) -> Vec<CoreFrequency> {
        self.cpu
            .cores()
            .iter()
            .map(|core| CoreFrequency {
                id: core.id,
                cur_freq: self.sysfs.read_u32(&core.cur_freq),
            })
            .collect()
    }
}

/// Marketing name of the first CPU, if the platform reports one
pub fn cpu_brand() -> Option<String> {
    let sys = System::new_with_specifics(
        RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing()),
    );
    sys.cpus()
        .first()
        .map(|c| c.brand().trim().to_string())
        .filter(|b| !b.is_empty())
}
