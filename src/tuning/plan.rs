use std::fmt;
use std::str::FromStr;

use crate::error::RequestError;
use crate::system::cpu::CpuInventory;
use crate::tuning::sanitize::{FreqRequest, RequestedValues};

/// Named presets for `--plan`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Powersave = 1,
    Performance = 2,
    MaxPerformance = 3,
}

impl Plan {
    pub fn all() -> &'static [Plan] {
        &[Plan::Powersave, Plan::Performance, Plan::MaxPerformance]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Plan::Powersave => "powersave",
            Plan::Performance => "performance",
            Plan::MaxPerformance => "max-performance",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Plan::Powersave => "lowest frequency, turbo off",
            Plan::Performance => "full range, turbo on, driver picks the frequency",
            Plan::MaxPerformance => "pinned to the maximum, turbo on",
        }
    }

    /// Expand into requested values. Turbo is translated through the
    /// inventory's polarity and left alone when unsupported.
    pub fn requested(&self, cpu: &CpuInventory) -> RequestedValues {
        let (min, max, turbo_on, governor) = match self {
            Plan::Powersave => (0, 0, false, "powersave"),
            Plan::Performance => (0, 100, true, "powersave"),
            Plan::MaxPerformance => (100, 100, true, "performance"),
        };

        RequestedValues {
            min: Some(FreqRequest::Percent(min)),
            max: Some(FreqRequest::Percent(max)),
            turbo: cpu
                .turbo
                .as_ref()
                .map(|t| i64::from(t.polarity.raw(turbo_on))),
            governor: Some(governor.to_string()),
            ..Default::default()
        }
    }
}

impl FromStr for Plan {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Plan::all()
            .iter()
            .copied()
            .find(|p| s == p.name() || s == (*p as u8).to_string())
            .ok_or(RequestError::UnknownPlan(s))
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
