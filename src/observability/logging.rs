//! Logging settings and optional subscriber setup.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `cql_gate=debug`.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

/// Installs a global fmt subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `settings.level`. Returns `Ok(false)`
/// when a global subscriber is already installed.
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub fn init_tracing(settings: &LoggingSettings) -> crate::config::ConfigResult<bool> {
    use tracing_subscriber::EnvFilter;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level).map_err(|e| {
            crate::config::ConfigError::InvalidValue {
                key: "log_level".to_string(),
                message: e.to_string(),
            }
        })?,
    };

    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok())
}
