use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter variable, e.g. `LOTTOBIAS_LOG=lottobias_engine=debug`.
pub const LOG_ENV: &str = "LOTTOBIAS_LOG";

/// Installs the stderr subscriber; `log` records from the libraries are bridged into it.
///
/// Falls back to `warn` when the variable is unset or invalid.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .try_init();
}
