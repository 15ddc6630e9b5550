//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

pub const LOG_ENV: &str = "ICEBERG_LOG";
pub const DEFAULT_FILTER: &str = "iceberg=info";

/// Installs a stderr subscriber filtered by `ICEBERG_LOG`, e.g.
/// `ICEBERG_LOG=iceberg::mapper=debug,iceberg::workspace=warn`.
///
/// Falls back to `iceberg=info` when the variable is unset or invalid. Only
/// the first call has an effect.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}
