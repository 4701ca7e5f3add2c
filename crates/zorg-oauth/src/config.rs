//! Configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [oauth]
//! authorization_code_lifetime = "10m"
//! access_token_lifetime = "1h"
//! token_bytes = 32
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every key can be overridden from the environment, e.g.
//! `ZORG_OAUTH__OAUTH__ACCESS_TOKEN_LIFETIME=30m`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::token::{DEFAULT_TOKEN_BYTES, MAX_TOKEN_LIFETIME, MIN_TOKEN_BYTES};

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration sources could not be read or merged.
    #[error("config build error: {0}")]
    Build(String),

    /// The merged configuration does not match the expected shape.
    #[error("config deserialize error: {0}")]
    Deserialize(String),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub oauth: OAuthConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Validates all sections.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.oauth.validate()?;
        self.logging.validate()
    }
}

/// Token lifetimes and sizes for the authorization-code flow.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Authorization code lifetime. Codes should be short-lived.
    #[serde(with = "humantime_serde")]
    pub authorization_code_lifetime: Duration,

    /// Access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Random bytes per generated token.
    pub token_bytes: usize,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            authorization_code_lifetime: Duration::from_secs(600), // 10 minutes
            access_token_lifetime: Duration::from_secs(3600),      // 1 hour
            token_bytes: DEFAULT_TOKEN_BYTES,
        }
    }
}

impl OAuthConfig {
    /// Sets the authorization code lifetime.
    #[must_use]
    pub fn with_authorization_code_lifetime(mut self, lifetime: Duration) -> Self {
        self.authorization_code_lifetime = lifetime;
        self
    }

    /// Sets the access token lifetime.
    #[must_use]
    pub fn with_access_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_token_lifetime = lifetime;
        self
    }

    /// Validates lifetimes and token size.
    ///
    /// # Errors
    ///
    /// Returns an error for zero lifetimes, lifetimes above
    /// [`MAX_TOKEN_LIFETIME`] or tokens below 128 bits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_lifetime(
            "oauth.authorization_code_lifetime",
            self.authorization_code_lifetime,
        )?;
        validate_lifetime("oauth.access_token_lifetime", self.access_token_lifetime)?;
        if self.token_bytes < MIN_TOKEN_BYTES {
            return Err(ConfigError::Invalid(format!(
                "oauth.token_bytes must be at least {MIN_TOKEN_BYTES}"
            )));
        }
        Ok(())
    }
}

fn validate_lifetime(key: &str, lifetime: Duration) -> Result<(), ConfigError> {
    if lifetime.is_zero() {
        return Err(ConfigError::Invalid(format!(
            "{key} must be greater than zero"
        )));
    }
    let within_bound =
        time::Duration::try_from(lifetime).is_ok_and(|lifetime| lifetime <= MAX_TOKEN_LIFETIME);
    if !within_bound {
        return Err(ConfigError::Invalid(format!(
            "{key} must not exceed {MAX_TOKEN_LIFETIME}"
        )));
    }
    Ok(())
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "logging.level must be one of trace, debug, info, warn, error (got '{other}')"
            ))),
        }
    }
}

pub mod loader {
    use super::{AppConfig, ConfigError};
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Default configuration file, looked up in the working directory.
    pub const DEFAULT_CONFIG_FILE: &str = "zorg-oauth.toml";

    /// Environment prefix for overrides.
    pub const ENV_PREFIX: &str = "ZORG_OAUTH";

    /// Loads the configuration from an optional TOML file and the environment.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or validation fails.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
        let file = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));

        let mut builder = Config::builder();
        if file.exists() {
            builder = builder.add_source(File::from(file));
        }
        // e.g. ZORG_OAUTH__OAUTH__TOKEN_BYTES=48
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__"),
        );

        let cfg = builder
            .build()
            .map_err(|e| ConfigError::Build(e.to_string()))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| ConfigError::Deserialize(e.to_string()))?;

        merged.validate()?;
        tracing::debug!(?merged, "Configuration loaded");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(
            config.oauth.authorization_code_lifetime,
            Duration::from_secs(600)
        );
        assert_eq!(config.oauth.access_token_lifetime, Duration::from_secs(3600));
        assert_eq!(config.oauth.token_bytes, 32);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_humantime_deserialize() {
        let config: OAuthConfig = toml::from_str(
            r#"
            authorization_code_lifetime = "5m"
            access_token_lifetime = "2h"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.authorization_code_lifetime,
            Duration::from_secs(300)
        );
        assert_eq!(config.access_token_lifetime, Duration::from_secs(7200));
        assert_eq!(config.token_bytes, 32);
    }

    #[test]
    fn test_validate_rejects_zero_lifetime() {
        let config = OAuthConfig::default().with_access_token_lifetime(Duration::ZERO);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_excessive_lifetime() {
        let config: AppConfig = toml::from_str(
            r#"
            [oauth]
            authorization_code_lifetime = "100000years"
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = OAuthConfig::default().with_access_token_lifetime(Duration::from_secs(
            7 * 24 * 60 * 60 + 1,
        ));
        assert!(config.validate().is_err());

        let config = OAuthConfig::default()
            .with_access_token_lifetime(Duration::from_secs(7 * 24 * 60 * 60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_tokens() {
        let config = OAuthConfig {
            token_bytes: 8,
            ..OAuthConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_level() {
        let config = AppConfig {
            logging: LoggingConfig {
                level: "loud".to_string(),
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
