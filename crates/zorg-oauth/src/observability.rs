//! Tracing setup driven by [`LoggingConfig`].
//!
//! ```ignore
//! let config = zorg_oauth::config::loader::load_config(None)?;
//! zorg_oauth::observability::init_from_config(&config.logging);
//! ```

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Set once the subscriber installed here became the global default.
static FILTER: OnceLock<FilterHandle> = OnceLock::new();

/// Installs the global `fmt` subscriber at `config.level`.
///
/// A `RUST_LOG` directive takes precedence over the configured level. If a
/// global subscriber already exists this does nothing and returns `false`.
pub fn init_from_config(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| config_filter(config));
    let (layer, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(layer)
        .with(fmt::layer())
        .try_init()
        .is_ok();
    if installed {
        let _ = FILTER.set(handle);
        tracing::debug!(level = %config.level, "Tracing initialized");
    }
    installed
}

/// Switches the active filter to `config.level` at runtime.
///
/// Returns `false` when tracing was not initialized through
/// [`init_from_config`].
pub fn apply_logging_config(config: &LoggingConfig) -> bool {
    let Some(handle) = FILTER.get() else {
        return false;
    };
    let applied = handle.reload(config_filter(config)).is_ok();
    if applied {
        tracing::info!(level = %config.level, "Log level changed");
    }
    applied
}

/// Returns the active filter directives, if tracing was initialized here.
pub fn current_filter() -> Option<String> {
    FILTER
        .get()
        .and_then(|handle| handle.with_current(ToString::to_string).ok())
}

fn config_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::new(config.level.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_config;

    #[test]
    fn test_loaded_level_reaches_filter() {
        assert!(!apply_logging_config(&LoggingConfig::default()));
        assert!(current_filter().is_none());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zorg-oauth.toml");
        std::fs::write(&path, "[logging]\nlevel = \"DEBUG\"\n").unwrap();
        let config = load_config(path.to_str()).unwrap();

        assert!(init_from_config(&config.logging));
        assert!(!init_from_config(&config.logging));

        assert!(apply_logging_config(&config.logging));
        assert_eq!(current_filter().as_deref(), Some("debug"));

        let quiet = LoggingConfig {
            level: "warn".to_string(),
        };
        assert!(apply_logging_config(&quiet));
        assert_eq!(current_filter().as_deref(), Some("warn"));
    }
}
