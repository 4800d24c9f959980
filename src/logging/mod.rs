// Logging module for structured logging using the tracing crate

use std::error::Error;

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Default filter when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "info";

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - Text or JSON formatting (JSON for log aggregation systems)
/// - Filtering from `RUST_LOG`, defaulting to `info`
/// - Output to stdout for container/cloud-native deployments
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
///
/// # Examples
///
/// ```
/// use image_proxy::config::LogFormat;
/// use image_proxy::logging::init_subscriber;
///
/// init_subscriber(LogFormat::Text).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(format: LogFormat) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Text => builder.with_target(false).try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    }
}
