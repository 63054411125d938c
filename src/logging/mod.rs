//! Logging support
//!
//! Filter construction for `tracing-subscriber` and a size-rotated file sink that
//! the subscriber writes through when a log file is configured.

pub mod rotating;

pub use rotating::RotatingFile;

use crate::config::LoggingConfig;
use std::io;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};

/// Open the configured log file behind a background writer thread.
///
/// Returns `None` when no file is configured. Events are flushed when the
/// returned [`WorkerGuard`] is dropped, so the caller must keep it alive for as
/// long as it logs.
pub fn file_writer(config: &LoggingConfig) -> io::Result<Option<(NonBlocking, WorkerGuard)>> {
    let Some(path) = &config.file else {
        return Ok(None);
    };
    let sink = RotatingFile::open(path, config.max_bytes, config.max_files)?;
    Ok(Some(tracing_appender::non_blocking(sink)))
}

/// Build filter directives string from LoggingConfig
///
/// Constructs a tracing filter string that includes the base log level
/// and any component-specific log levels configured in the LoggingConfig.
///
/// # Examples
///
/// ```
/// use bridgeport::config::LoggingConfig;
/// use bridgeport::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("bridge".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     component_levels: Some(component_levels),
///     ..LoggingConfig::default()
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,bridgeport::bridge=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",bridgeport::{}={}", component, level));
        }
    }

    filter_str
}
