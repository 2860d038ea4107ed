//! Tracing configuration and initialization.

use tracing_subscriber::{
    EnvFilter,
    fmt::format::FmtSpan,
    util::{SubscriberInitExt as _, TryInitError},
};

/// Environment variable consulted before `RUST_LOG`.
const LOG_ENV: &str = "ANYFS_LOG";

enum TrcMode {
    /// Plain, verbose output with span events. Picked when the user asked for a filter.
    Verbose,
    /// Compact output without timestamps.
    Compact,
}

pub struct Trc {
    mode: TrcMode,
    env_filter: EnvFilter,
}

impl Default for Trc {
    fn default() -> Self {
        let maybe_env_filter =
            EnvFilter::try_from_env(LOG_ENV).or_else(|_| EnvFilter::try_from_default_env());

        match maybe_env_filter {
            Ok(env_filter) => Self {
                // A user who sets a filter is debugging and wants everything.
                mode: TrcMode::Verbose,
                env_filter,
            },
            Err(_) => Self {
                mode: TrcMode::Compact,
                env_filter: EnvFilter::new("info"),
            },
        }
    }
}

impl Trc {
    pub fn init(self) -> Result<(), TryInitError> {
        match self.mode {
            TrcMode::Verbose => tracing_subscriber::fmt()
                .with_env_filter(self.env_filter)
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::ENTER | FmtSpan::CLOSE)
                .finish()
                .try_init(),
            TrcMode::Compact => tracing_subscriber::fmt()
                .with_env_filter(self.env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .compact()
                .finish()
                .try_init(),
        }
    }
}
