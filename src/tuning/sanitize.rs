//! Turns requested values into bounds that are safe to write.
//!
//! Everything here is pure: the live values come in through [`Baseline`],
//! which is the only place that can reject an insane system.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{InsaneSystemError, RequestError};
use crate::system::collector::CpuSnapshot;
use crate::system::cpu::CpuInventory;

/// A requested frequency bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreqRequest {
    /// Absolute value in kHz.
    Khz(u64),
    /// Percentage of `cpuinfo_max_freq`.
    Percent(u8),
}

impl FreqRequest {
    fn resolve(self, info_max: u32) -> u64 {
        match self {
            FreqRequest::Khz(khz) => khz,
            FreqRequest::Percent(pct) => u64::from(info_max) * u64::from(pct) / 100,
        }
    }
}

impl FromStr for FreqRequest {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || RequestError::BadFrequency {
            value: s.to_string(),
        };
        let s = s.trim();
        match s.strip_suffix('%') {
            Some(pct) => match pct.trim().parse::<u8>() {
                Ok(p) if p <= 100 => Ok(FreqRequest::Percent(p)),
                _ => Err(bad()),
            },
            None => s.parse::<u64>().map(FreqRequest::Khz).map_err(|_| bad()),
        }
    }
}

impl fmt::Display for FreqRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreqRequest::Khz(khz) => write!(f, "{} kHz", khz),
            FreqRequest::Percent(pct) => write!(f, "{}%", pct),
        }
    }
}

/// What the user asked for. `None` keeps the current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedValues {
    pub min: Option<FreqRequest>,
    pub max: Option<FreqRequest>,
    pub turbo: Option<i64>,
    pub governor: Option<String>,
    pub sleep: bool,
}

impl Default for RequestedValues {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            turbo: None,
            governor: None,
            sleep: true,
        }
    }
}

impl RequestedValues {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.turbo.is_none() && self.governor.is_none()
    }
}

/// The live values a set operation starts from, all known to be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    pub info_min: u32,
    pub info_max: u32,
    pub current_min: u32,
    pub current_max: u32,
    pub governor: String,
    /// `None` when turbo is unsupported.
    pub turbo: Option<u8>,
}

impl Baseline {
    /// Check every value the sanitizer needs. Core 0 supplies the current values.
    pub fn new(cpu: &CpuInventory, snapshot: &CpuSnapshot) -> Result<Self, InsaneSystemError> {
        let info_min = cpu.info_min.ok_or(InsaneSystemError::InfoMin)?;
        let info_max = cpu.info_max.ok_or(InsaneSystemError::InfoMax)?;
        if info_min == 0 {
            return Err(InsaneSystemError::InfoMin);
        }
        if info_min >= info_max {
            return Err(InsaneSystemError::InfoRange {
                min: info_min,
                max: info_max,
            });
        }

        let core0 = snapshot.first();
        let current_min = core0
            .and_then(|c| c.scaling_min)
            .ok_or(InsaneSystemError::CurrentMin)?;
        let current_max = core0
            .and_then(|c| c.scaling_max)
            .ok_or(InsaneSystemError::CurrentMax)?;
        let governor = core0
            .and_then(|c| c.governor.clone())
            .filter(|g| !g.is_empty())
            .ok_or(InsaneSystemError::Governor)?;

        Ok(Self {
            info_min,
            info_max,
            current_min,
            current_max,
            governor,
            turbo: cpu.turbo.as_ref().and(snapshot.turbo),
        })
    }
}

/// Bounds ready to be committed. `info_min <= min < max <= info_max` holds
/// for both the real and the sane pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedValues {
    pub min: u32,
    pub max: u32,
    pub sane_min: u32,
    pub sane_max: u32,
    /// Current minimum before any write, decides the real-phase order.
    pub current_min: u32,
    pub turbo: Option<u8>,
    pub governor: String,
}

/// Clamp a min/max pair into the hardware range; min always yields to max.
fn bound_pair(min: u64, max: u64, info_min: u32, info_max: u32) -> (u32, u32) {
    let lo = u64::from(info_min);
    let hi = u64::from(info_max);
    let min = min.clamp(lo, hi - 1) as u32;
    let max = max.clamp(lo + 1, hi) as u32;
    if min >= max {
        (max - 1, max)
    } else {
        (min, max)
    }
}

/// Compute the values to write.
pub fn compute(base: &Baseline, requested: &RequestedValues) -> SanitizedValues {
    let wanted_min = requested
        .min
        .map_or(u64::from(base.current_min), |r| r.resolve(base.info_max));
    let wanted_max = requested
        .max
        .map_or(u64::from(base.current_max), |r| r.resolve(base.info_max));
    let (min, max) = bound_pair(wanted_min, wanted_max, base.info_min, base.info_max);
    debug!(wanted_min, wanted_max, min, max, "bound the CPU min/max");

    let (sane_min, sane_max) = bound_pair(
        FreqRequest::Percent(0).resolve(base.info_max),
        FreqRequest::Percent(100).resolve(base.info_max),
        base.info_min,
        base.info_max,
    );
    debug!(sane_min, sane_max, "sane min/max");

    let turbo = base.turbo.map(|current| {
        let wanted = requested.turbo.unwrap_or(i64::from(current));
        wanted.clamp(0, 1) as u8
    });

    let governor = requested
        .governor
        .clone()
        .unwrap_or_else(|| base.governor.clone());

    SanitizedValues {
        min,
        max,
        sane_min,
        sane_max,
        current_min: base.current_min,
        turbo,
        governor,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::system::collector::CoreState;

    fn baseline(current_min: u32, current_max: u32) -> Baseline {
        Baseline {
            info_min: 800000,
            info_max: 3400000,
            current_min,
            current_max,
            governor: "powersave".into(),
            turbo: Some(0),
        }
    }

    #[test]
    fn low_max_pulls_min_below_it() {
        let base = baseline(1600000, 3400000);
        let req = RequestedValues {
            max: Some(FreqRequest::Khz(1000000)),
            ..Default::default()
        };

        let out = compute(&base, &req);
        assert_eq!(out.max, 1000000);
        assert_eq!(out.min, 999999);
        assert_eq!(out.current_min, 1600000);
    }

    #[test]
    fn nothing_requested_keeps_current_values() {
        let base = baseline(1200000, 3000000);
        let out = compute(&base, &RequestedValues::default());
        assert_eq!((out.min, out.max), (1200000, 3000000));
        assert_eq!(out.governor, "powersave");
        assert_eq!(out.turbo, Some(0));
    }

    #[test]
    fn equal_current_values_are_only_separated() {
        let base = baseline(2000000, 2000000);
        let out = compute(&base, &RequestedValues::default());
        assert_eq!(out.max, 2000000);
        assert_eq!(out.min, 1999999);
    }

    #[test]
    fn requests_are_clamped_into_hardware_range() {
        let base = baseline(1600000, 3400000);
        let req = RequestedValues {
            min: Some(FreqRequest::Khz(1)),
            max: Some(FreqRequest::Khz(9_000_000)),
            ..Default::default()
        };
        let out = compute(&base, &req);
        assert_eq!((out.min, out.max), (800000, 3400000));
    }

    #[test]
    fn percentages_resolve_against_info_max() {
        let base = baseline(800000, 3400000);
        let req = RequestedValues {
            min: Some(FreqRequest::Percent(50)),
            max: Some(FreqRequest::Percent(0)),
            ..Default::default()
        };
        let out = compute(&base, &req);
        // 0% clamps to info_min + 1, so min follows it down
        assert_eq!((out.min, out.max), (800000, 800001));
    }

    #[test]
    fn sane_pair_spans_the_whole_range() {
        let out = compute(&baseline(1600000, 2000000), &RequestedValues::default());
        assert_eq!((out.sane_min, out.sane_max), (800000, 3400000));
    }

    #[test]
    fn narrow_range_collapses_to_adjacent_values() {
        let base = Baseline {
            info_min: 100,
            info_max: 101,
            ..baseline(100, 101)
        };
        let req = RequestedValues {
            min: Some(FreqRequest::Khz(500)),
            ..Default::default()
        };
        let out = compute(&base, &req);
        assert_eq!((out.min, out.max), (100, 101));
        assert_eq!((out.sane_min, out.sane_max), (100, 101));
    }

    #[test]
    fn turbo_is_clamped_and_skipped_when_unsupported() {
        let req = RequestedValues {
            turbo: Some(7),
            ..Default::default()
        };
        assert_eq!(compute(&baseline(1, 2), &req).turbo, Some(1));

        let req = RequestedValues {
            turbo: Some(-3),
            ..Default::default()
        };
        assert_eq!(compute(&baseline(1, 2), &req).turbo, Some(0));

        let unsupported = Baseline {
            turbo: None,
            ..baseline(1, 2)
        };
        assert_eq!(compute(&unsupported, &req).turbo, None);
    }

    #[test]
    fn requested_governor_wins() {
        let req = RequestedValues {
            governor: Some("performance".into()),
            ..Default::default()
        };
        assert_eq!(compute(&baseline(1, 2), &req).governor, "performance");
    }

    #[test]
    fn parses_frequency_requests() {
        assert_eq!("2400000".parse::<FreqRequest>(), Ok(FreqRequest::Khz(2400000)));
        assert_eq!(" 80% ".parse::<FreqRequest>(), Ok(FreqRequest::Percent(80)));
        assert!("101%".parse::<FreqRequest>().is_err());
        assert!("-1".parse::<FreqRequest>().is_err());
        assert!("fast".parse::<FreqRequest>().is_err());
    }

    fn inventory(info_min: Option<u32>, info_max: Option<u32>) -> CpuInventory {
        CpuInventory::from_parts(1, true, info_min, info_max, None).unwrap()
    }

    fn snapshot(min: Option<u32>, max: Option<u32>, governor: Option<&str>) -> CpuSnapshot {
        CpuSnapshot {
            cores: vec![CoreState {
                id: 0,
                scaling_min: min,
                scaling_max: max,
                governor: governor.map(str::to_string),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn baseline_rejects_insane_systems() {
        let good = snapshot(Some(1), Some(2), Some("powersave"));
        assert_eq!(
            Baseline::new(&inventory(None, Some(2)), &good),
            Err(InsaneSystemError::InfoMin)
        );
        assert_eq!(
            Baseline::new(&inventory(Some(1), None), &good),
            Err(InsaneSystemError::InfoMax)
        );
        assert_eq!(
            Baseline::new(&inventory(Some(5), Some(5)), &good),
            Err(InsaneSystemError::InfoRange { min: 5, max: 5 })
        );

        let cpu = inventory(Some(1), Some(10));
        assert_eq!(
            Baseline::new(&cpu, &snapshot(None, Some(2), Some("powersave"))),
            Err(InsaneSystemError::CurrentMin)
        );
        assert_eq!(
            Baseline::new(&cpu, &snapshot(Some(1), None, Some("powersave"))),
            Err(InsaneSystemError::CurrentMax)
        );
        assert_eq!(
            Baseline::new(&cpu, &snapshot(Some(1), Some(2), None)),
            Err(InsaneSystemError::Governor)
        );
        assert!(Baseline::new(&cpu, &good).is_ok());
    }

    #[test]
    fn baseline_ignores_turbo_without_control() {
        let cpu = inventory(Some(1), Some(10));
        let snap = CpuSnapshot {
            turbo: Some(1),
            ..snapshot(Some(1), Some(2), Some("powersave"))
        };
        assert_eq!(Baseline::new(&cpu, &snap).unwrap().turbo, None);
    }

    proptest! {
        #[test]
        fn bounds_always_hold(
            info_min in 1u32..5_000_000,
            span in 1u32..5_000_000,
            cur_min in 0u32..10_000_000,
            cur_max in 0u32..10_000_000,
            req_min in proptest::option::of(0u64..20_000_000),
            req_max in proptest::option::of(0u64..20_000_000),
            turbo in proptest::option::of(-5i64..5),
        ) {
            let base = Baseline {
                info_min,
                info_max: info_min + span,
                current_min: cur_min,
                current_max: cur_max,
                governor: "powersave".into(),
                turbo: Some(1),
            };
            let req = RequestedValues {
                min: req_min.map(FreqRequest::Khz),
                max: req_max.map(FreqRequest::Khz),
                turbo,
                ..Default::default()
            };

            let out = compute(&base, &req);
            prop_assert!(base.info_min <= out.min);
            prop_assert!(out.min < out.max);
            prop_assert!(out.max <= base.info_max);
            prop_assert!(base.info_min <= out.sane_min);
            prop_assert!(out.sane_min < out.sane_max);
            prop_assert!(out.sane_max <= base.info_max);
            prop_assert!(matches!(out.turbo, Some(0) | Some(1)));
            prop_assert_eq!(&out, &compute(&base, &req));
        }
    }
}
