//! Tracing setup shared by the Lambda functions and the CLI.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Level-only override read when `RUST_LOG` is absent.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, for CloudWatch.
    Json,
    Text,
}

/// `RUST_LOG` wins, then `LOG_LEVEL`, then `info`.
pub fn filter_directive(rust_log: Option<&str>, log_level: Option<&str>) -> String {
    [rust_log, log_level]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "info".to_string())
}

/// Installs the global subscriber. Later calls leave the first one in place.
pub fn init_tracing(format: LogFormat) {
    let directive = filter_directive(
        std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
        std::env::var(LOG_LEVEL_ENV).ok().as_deref(),
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };
    // Already installed, e.g. by a warm Lambda container or a test harness.
    let _ = result;
}
