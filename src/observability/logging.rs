//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Resolve the log filter from the environment or configuration
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - Human-readable fmt output; fields stay structured

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(config: &ObservabilityConfig) -> String {
    format!("rest_bridge={}", config.log_level.to_ascii_lowercase())
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(config).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
