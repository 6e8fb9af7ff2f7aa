//! pstate-frequency: report and adjust CPU frequency scaling through sysfs.
//!
//! Discovery builds a [`system::cpu::CpuInventory`] once, the sanitizer turns
//! requested values into safe bounds, and the commit sequencer writes them to
//! every core in an order the driver accepts. Primarily aimed at intel_pstate.

pub mod cli;
pub mod color_scheme;
pub mod config;
pub mod error;
pub mod logging;
pub mod system;
pub mod tuning;
pub mod ui;
