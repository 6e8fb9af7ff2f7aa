//! pstate-frequency: easier control of the Intel p-state driver.
//!
//! Features:
//!   - Report driver, governor, turbo and min/max bounds per core
//!   - Real-time per-core frequencies
//!   - Set min/max (kHz or percent), turbo and governor on every core
//!   - Predefined plans (powersave, performance, max-performance)
//!
//! Run with `--help` for the full option list.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::debug;

use psfreq::cli::{Action, Args, GetMode};
use psfreq::color_scheme::ColorScheme;
use psfreq::config::PsfreqConfig;
use psfreq::error::Error;
use psfreq::logging::{self, Verbosity};
use psfreq::system::collector::{cpu_brand, Collector};
use psfreq::system::cpu::CpuInventory;
use psfreq::system::sysfs::SysfsTree;
use psfreq::tuning;
use psfreq::ui::report;

fn main() -> ExitCode {
    let args = Args::parse();
    let verbosity = args.verbosity();
    let config = PsfreqConfig::load(args.config.as_deref());
    let colors = ColorScheme::new(args.color || config.color, config.color_scheme_id);
    logging::init(verbosity, colors.enabled);

    debug!(?config, scheme = config.color_scheme_id.name(), "configuration");

    match run(&args, &config, verbosity, &colors) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if verbosity.shows_errors() {
                eprintln!("{}", report::render_error(&e.to_string(), &colors));
            }
            ExitCode::FAILURE
        }
    }
}

/// Discover the CPU, then get or set
fn run(args: &Args, config: &PsfreqConfig, verbosity: Verbosity, colors: &ColorScheme) -> Result<()> {
    let action = args.action();
    if action == Action::None {
        Args::command().print_help().context("failed to print help")?;
        return Ok(());
    }

    let sysfs = SysfsTree::new(&config.sysfs_root);
    let cpu = CpuInventory::discover(&sysfs, &config.cpuinfo_path).map_err(Error::from)?;
    let polarity = cpu.turbo.as_ref().map(|t| t.polarity);

    match action {
        Action::Get(GetMode::Current) => {
            let snapshot = Collector::new(&sysfs, &cpu).snapshot();
            if verbosity.shows_report() {
                print!("{}", report::render_current(&snapshot, polarity, cpu_brand().as_deref(), colors));
            }
        }
        Action::Get(GetMode::Realtime) => {
            let freqs = Collector::new(&sysfs, &cpu).realtime();
            if verbosity.shows_report() {
                print!("{}", report::render_realtime(&freqs, colors));
            }
        }
        Action::Set => {
            // Checked before anything is written
            tuning::ensure_root()?;

            let requested = args.requested(&cpu);
            let outcome = tuning::set(&sysfs, &cpu, &requested, config.strategy())?;
            if outcome.report.is_partial() && verbosity.shows_errors() {
                let line = format!(
                    "[Warning] {} of {} writes failed",
                    outcome.report.failures.len(),
                    outcome.report.attempted
                );
                eprintln!("{}", colors.paint(line, colors.warning, true));
            }

            let snapshot = Collector::new(&sysfs, &cpu).snapshot();
            if verbosity.shows_report() {
                print!("{}", report::render_current(&snapshot, polarity, cpu_brand().as_deref(), colors));
            }
        }
        Action::None => {}
    }

    Ok(())
}
