//! Logging setup for the vigil binary.
//!
//! Builds a `tracing` dispatcher instead of installing a global subscriber;
//! the caller hands it to `ScanManager::with_dispatch` and drops it when the
//! run ends.

use tracing::Dispatch;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "vigil=info";
const DEBUG_LOG_FILTER: &str = "vigil=debug";

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "VIGIL_LOG";

pub struct LogOptions {
    pub debug: bool,
    pub ansi: bool,
}

fn filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if debug {
            DEBUG_LOG_FILTER
        } else {
            DEFAULT_LOG_FILTER
        })
    })
}

/// Compact stderr logger without timestamps.
pub fn init(options: LogOptions) -> Dispatch {
    let subscriber = tracing_subscriber::registry().with(filter(options.debug)).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(options.ansi)
            .without_time(),
    );
    Dispatch::new(subscriber)
}
