use flexi_logger::LogSpecification;
use log::warn;

mod views;

pub mod app;

pub use app::{App, Message};

/// Parses `log_level` as a flexi_logger spec, honouring `RUST_LOG`. An invalid
/// level keeps the default `info` spec.
pub fn get_log_spec(log_level: &str) -> LogSpecification {
    LogSpecification::env_or_parse(log_level).unwrap_or_else(|err| {
        warn!("Failed to parse log level '{log_level}': {err}");
        LogSpecification::info()
    })
}

