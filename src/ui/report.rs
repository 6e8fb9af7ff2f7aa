use std::fmt::Write;

use unicode_width::UnicodeWidthStr;

use crate::color_scheme::ColorScheme;
use crate::system::collector::{CoreFrequency, CpuSnapshot};
use crate::system::cpu::TurboPolarity;

/// Column layout of the per-core table: (name, width)
const CORE_HEADERS: &[(&str, usize)] = &[
    ("CPU", 5),
    ("MIN", 14),
    ("MAX", 14),
    ("GOVERNOR", 0), // last column: no padding
];

const MISSING: &str = "unavailable";

/// Left-align `s` in `width` terminal cells
fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - w))
    }
}

fn percent_of(value: u32, max: Option<u32>) -> Option<u64> {
    match max {
        Some(max) if max > 0 => Some(u64::from(value) * 100 / u64::from(max)),
        _ => None,
    }
}

fn khz(value: Option<u32>, info_max: Option<u32>) -> String {
    match (value, value.and_then(|v| percent_of(v, info_max))) {
        (Some(v), Some(pct)) => format!("{}KHz {}%", v, pct),
        (Some(v), None) => format!("{}KHz", v),
        (None, _) => MISSING.to_string(),
    }
}

fn field(out: &mut String, cs: &ColorScheme, label: &str, value: &str, missing: bool) {
    let color = if missing { cs.missing } else { cs.value };
    let _ = writeln!(
        out,
        "    {} -> {}",
        cs.paint(pad(label, 20), cs.label, true),
        cs.paint(value, color, false)
    );
}

/// Render the current scaling state.
pub fn render_current(
    snapshot: &CpuSnapshot,
    polarity: Option<TurboPolarity>,
    brand: Option<&str>,
    cs: &ColorScheme,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        cs.paint(
            format!("    pstate-frequency {}", env!("CARGO_PKG_VERSION")),
            cs.title,
            true
        )
    );
    if let Some(brand) = brand {
        field(&mut out, cs, "pstate::CPU", brand, false);
    }

    let driver = snapshot.driver.as_deref();
    field(&mut out, cs, "pstate::CPU_DRIVER", driver.unwrap_or(MISSING), driver.is_none());

    let core0 = snapshot.first();
    let governor = core0.and_then(|c| c.governor.as_deref());
    field(&mut out, cs, "pstate::CPU_GOVERNOR", governor.unwrap_or(MISSING), governor.is_none());

    match (snapshot.turbo, polarity) {
        (Some(raw), Some(polarity)) => {
            let label = match polarity {
                TurboPolarity::NoTurbo => "pstate::NO_TURBO",
                TurboPolarity::Boost => "pstate::TURBO_BOOST",
            };
            let on = polarity.is_enabled(raw);
            let _ = writeln!(
                out,
                "    {} -> {} : {}",
                cs.paint(pad(label, 20), cs.label, true),
                cs.paint(raw, cs.value, false),
                if on {
                    cs.paint("ON", cs.turbo_on, true)
                } else {
                    cs.paint("OFF", cs.turbo_off, true)
                }
            );
        }
        _ => field(&mut out, cs, "pstate::TURBO", "not supported", true),
    }

    field(
        &mut out,
        cs,
        "pstate::CPU_INFO_MIN",
        &khz(snapshot.info_min, snapshot.info_max),
        snapshot.info_min.is_none(),
    );
    field(
        &mut out,
        cs,
        "pstate::CPU_INFO_MAX",
        &khz(snapshot.info_max, snapshot.info_max),
        snapshot.info_max.is_none(),
    );
    let min = core0.and_then(|c| c.scaling_min);
    let max = core0.and_then(|c| c.scaling_max);
    field(&mut out, cs, "pstate::CPU_MIN", &khz(min, snapshot.info_max), min.is_none());
    field(&mut out, cs, "pstate::CPU_MAX", &khz(max, snapshot.info_max), max.is_none());

    if snapshot.cores.len() > 1 {
        out.push('\n');
        let header: String = CORE_HEADERS
            .iter()
            .map(|(name, width)| pad(name, *width))
            .collect();
        let _ = writeln!(out, "    {}", cs.paint(header.trim_end(), cs.label, true));
        for core in &snapshot.cores {
            let _ = writeln!(
                out,
                "    {}{}{}{}",
                cs.paint(pad(&core.id.to_string(), CORE_HEADERS[0].1), cs.core_id, false),
                pad(&opt_khz(core.scaling_min), CORE_HEADERS[1].1),
                pad(&opt_khz(core.scaling_max), CORE_HEADERS[2].1),
                core.governor.as_deref().unwrap_or(MISSING),
            );
        }
    }

    out
}

fn opt_khz(value: Option<u32>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{}KHz", v))
}

/// Render instantaneous per-core frequencies in MHz.
pub fn render_realtime(freqs: &[CoreFrequency], cs: &ColorScheme) -> String {
    let mut out = String::new();
    for core in freqs {
        let label = format!("pstate::CPU[{}]", core.id);
        let value = match core.cur_freq {
            Some(khz) => format!("{:.2}MHz", f64::from(khz) / 1000.0),
            None => MISSING.to_string(),
        };
        field(&mut out, cs, &label, &value, core.cur_freq.is_none());
    }
    out
}

/// One-line "[Error] ..." message.
pub fn render_error(message: &str, cs: &ColorScheme) -> String {
    cs.paint(format!("[Error] {}", message), cs.error, true).to_string()
}
