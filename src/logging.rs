//! Stderr logging for the CLI.
//!
//! Components only emit `tracing` events; how loud the program is gets
//! decided once here from the command line.

use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

/// How much the program prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Nothing at all, not even errors
    AllQuiet,
    /// Errors only, no report
    Quiet,
    #[default]
    Normal,
    Debug,
}

impl Verbosity {
    pub fn from_flags(all_quiet: bool, quiet: bool, debug: bool) -> Self {
        if all_quiet {
            Verbosity::AllQuiet
        } else if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    pub fn level(self) -> LevelFilter {
        match self {
            Verbosity::AllQuiet => LevelFilter::OFF,
            Verbosity::Quiet => LevelFilter::ERROR,
            Verbosity::Normal => LevelFilter::WARN,
            Verbosity::Debug => LevelFilter::DEBUG,
        }
    }

    pub fn shows_report(self) -> bool {
        self >= Verbosity::Normal
    }

    pub fn shows_errors(self) -> bool {
        self > Verbosity::AllQuiet
    }
}

/// Wall-clock time of day on each line
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Build the fmt subscriber writing to `writer`. `ansi` follows the
/// report's color decision.
pub fn subscriber<W>(verbosity: Verbosity, ansi: bool, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_max_level(verbosity.level())
        .with_timer(LocalTime)
        .with_target(verbosity == Verbosity::Debug)
        .with_ansi(ansi)
        .finish()
}

/// Install the global stderr subscriber. Safe to call more than once.
pub fn init(verbosity: Verbosity, ansi: bool) {
    let _ = subscriber(verbosity, ansi, std::io::stderr).try_init();
}
