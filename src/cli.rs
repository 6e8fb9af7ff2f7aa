use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::logging::Verbosity;
use crate::system::cpu::CpuInventory;
use crate::tuning::plan::Plan;
use crate::tuning::sanitize::{FreqRequest, RequestedValues};

#[derive(Parser, Debug)]
#[command(
    name = "pstate-frequency",
    version,
    about = "Easier control of the Intel p-state driver",
    disable_help_flag = true
)]
pub struct Args {
    /// Show help
    #[arg(short = 'H', long, action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Access current CPU values
    #[arg(short = 'G', long, conflicts_with = "set")]
    pub get: bool,

    /// Modify current CPU values (requires root)
    #[arg(short = 'S', long)]
    pub set: bool,

    /// Display the current user-set CPU values (default for --get)
    #[arg(short = 'c', long, conflicts_with = "real")]
    pub current: bool,

    /// Display the real-time CPU frequencies
    #[arg(short = 'r', long)]
    pub real: bool,

    /// Set a predefined plan: powersave (1), performance (2), max-performance (3)
    #[arg(short = 'p', long, value_name = "PLAN")]
    pub plan: Option<Plan>,

    /// Modify current CPU max frequency, in kHz or as a percentage (e.g. 80%)
    #[arg(short = 'm', long, value_name = "FREQ")]
    pub max: Option<FreqRequest>,

    /// Modify current CPU min frequency, in kHz or as a percentage (e.g. 20%)
    #[arg(short = 'n', long, value_name = "FREQ")]
    pub min: Option<FreqRequest>,

    /// Raw turbo value written to no_turbo (intel_pstate) or boost
    #[arg(short = 't', long, value_name = "0|1", allow_negative_numbers = true)]
    pub turbo: Option<i64>,

    /// Set the cpufreq governor
    #[arg(short = 'g', long, value_name = "NAME")]
    pub governor: Option<String>,

    /// Skip the pause between the sane and the real write
    #[arg(long)]
    pub no_sleep: bool,

    /// Suppress normal output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Suppress all output, including errors
    #[arg(short = 'a', long)]
    pub all_quiet: bool,

    /// Print debugging messages to stderr
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Colorize output
    #[arg(long)]
    pub color: bool,

    /// Read settings from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetMode {
    Current,
    Realtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Get(GetMode),
    Set,
    /// No action flag given; print usage
    None,
}

impl Args {
    pub fn action(&self) -> Action {
        if self.set {
            Action::Set
        } else if self.get {
            if self.real {
                Action::Get(GetMode::Realtime)
            } else {
                Action::Get(GetMode::Current)
            }
        } else {
            Action::None
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.all_quiet, self.quiet, self.debug)
    }

    /// Plan values first, explicit options on top.
    pub fn requested(&self, cpu: &CpuInventory) -> RequestedValues {
        let mut req = self
            .plan
            .map(|p| p.requested(cpu))
            .unwrap_or_default();

        if self.min.is_some() {
            req.min = self.min;
        }
        if self.max.is_some() {
            req.max = self.max;
        }
        if self.turbo.is_some() {
            req.turbo = self.turbo;
        }
        if let Some(governor) = &self.governor {
            req.governor = Some(governor.clone());
        }
        req.sleep = !self.no_sleep;
        req
    }
}
