pub mod collector;
pub mod cpu;
pub mod sysfs;
