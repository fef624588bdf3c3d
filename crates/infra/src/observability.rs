//! Telemetry initialization
//!
//! Call once at process start. Log level defaults to `info` and is
//! overridable through `RUST_LOG`.

use tracing_subscriber::EnvFilter;

pub fn init_telemetry() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}
