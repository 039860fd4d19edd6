//! # proofread-telemetry
//!
//! One-shot `tracing` subscriber setup for the proofreading binaries.
//!
//! The filter is built from [`TelemetryConfig`] (default level plus
//! per-module overrides) unless `RUST_LOG` is set, which always wins.
//! Output is either human-readable or one JSON object per line.

#![deny(unsafe_code)]

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by `RUST_LOG`.
    pub log_level: Level,
    /// Per-module level overrides (e.g. `"proofread_rag" => DEBUG`).
    pub module_levels: Vec<(String, Level)>,
    /// Emit JSON lines instead of the human-readable format.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    /// Build a config from a level name such as `"debug"`; unknown names
    /// fall back to `info`.
    pub fn from_level_name(name: &str, json: bool) -> Self {
        Self {
            log_level: parse_level(name).unwrap_or(Level::INFO),
            module_levels: Vec::new(),
            json,
        }
    }
}

/// Errors raised while installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Handle describing the installed subscriber.
#[derive(Clone, Debug)]
pub struct TelemetryGuard {
    directives: String,
}

impl TelemetryGuard {
    /// Filter directives derived from the config (ignores `RUST_LOG`).
    pub fn directives(&self) -> &str {
        &self.directives
    }
}

/// Render the filter directives for a config, e.g. `info,proofread_rag=debug`.
pub fn filter_directives(config: &TelemetryConfig) -> String {
    let mut filter = config.log_level.to_string().to_lowercase();
    for (module, level) in &config.module_levels {
        filter.push_str(&format!(",{}={}", module, level.to_string().to_lowercase()));
    }
    filter
}

/// Parse a level name, case-insensitively.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize the global subscriber. Call once at startup.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let directives = filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry().with(fmt_layer).try_init()?;

    Ok(TelemetryGuard { directives })
}
