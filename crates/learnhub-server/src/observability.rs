//! Tracing setup.
//!
//! The filter is chosen once at startup, before the configuration file is
//! read, and may be replaced when the configured level becomes known.
//! `RUST_LOG` always wins over `logging.level`.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

const DEFAULT_LEVEL: &str = "info";

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Where the active log filter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSource {
    /// A valid `RUST_LOG` directive.
    Environment,
    /// `logging.level` from the configuration.
    Config,
    /// Neither was usable.
    Default,
}

impl std::fmt::Display for LevelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Environment => "RUST_LOG",
            Self::Config => "logging.level",
            Self::Default => "default",
        })
    }
}

/// Picks the filter from `RUST_LOG`, then `configured`, then `info`.
/// Unparseable directives are skipped rather than failing startup.
fn select_filter(rust_log: Option<&str>, configured: Option<&str>) -> (EnvFilter, LevelSource) {
    let candidates = [
        (rust_log, LevelSource::Environment),
        (configured, LevelSource::Config),
    ];
    candidates
        .into_iter()
        .filter_map(|(directive, source)| {
            let directive = directive?.trim();
            if directive.is_empty() {
                return None;
            }
            EnvFilter::try_new(directive).ok().map(|f| (f, source))
        })
        .next()
        .unwrap_or_else(|| (EnvFilter::new(DEFAULT_LEVEL), LevelSource::Default))
}

fn rust_log() -> Option<String> {
    std::env::var(EnvFilter::DEFAULT_ENV).ok()
}

/// Installs the global subscriber. Calling it again is a no-op.
pub fn init_tracing() -> LevelSource {
    let (filter, source) = select_filter(rust_log().as_deref(), None);
    let (filter_layer, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok();
    if installed {
        let _ = FILTER_HANDLE.set(handle);
    }
    source
}

/// Switches to the configured level unless `RUST_LOG` is in charge, and
/// logs which source ended up deciding the filter.
pub fn apply_logging_level(level: &str) -> LevelSource {
    let (filter, source) = select_filter(rust_log().as_deref(), Some(level));
    let directive = filter.to_string();

    if source != LevelSource::Environment
        && let Some(handle) = FILTER_HANDLE.get()
        && let Err(e) = handle.reload(filter)
    {
        tracing::warn!(error = %e, "Could not switch log level");
        return source;
    }

    tracing::info!(filter = %directive, source = %source, "Log filter active");
    source
}
