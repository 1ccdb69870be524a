//! Plugin logger setup
//!
//! The engine has no log sink for plugins, so the plugin installs its own
//! `env_logger` the first time the engine starts it.

use std::fs::File;
use std::sync::Once;

/// Filter variable checked before `RUST_LOG`
pub const LOG_FILTER_VAR: &str = "SPRITE3D_LOG";
/// When set, log lines are appended to this file instead of stderr
pub const LOG_FILE_VAR: &str = "SPRITE3D_LOG_FILE";

/// Logger configuration.
///
/// `env_filter` uses the `env_logger` filter syntax, e.g.
/// "info" or "sprite3d_backend=debug".
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    pub log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            log_file: None,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            env_filter: std::env::var(LOG_FILTER_VAR).ok(),
            log_file: std::env::var(LOG_FILE_VAR).ok().filter(|path| !path.is_empty()),
            ..Default::default()
        }
    }
}

static INIT: Once = Once::new();

/// Install the global logger once; later calls are ignored.
///
/// A host application that already installed a logger keeps it.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.env_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        builder.write_style(config.write_style);

        if let Some(path) = &config.log_file {
            match File::options().create(true).append(true).open(path) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                    builder.write_style(env_logger::WriteStyle::Never);
                }
                Err(err) => eprintln!("sprite3d: cannot open log file {}: {}", path, err),
            }
        }

        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_no_overrides() {
        let config = LoggingConfig::default();
        assert!(config.env_filter.is_none());
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_init_is_idempotent() {
        init_logging(LoggingConfig::default());
        init_logging(LoggingConfig {
            env_filter: Some("trace".into()),
            ..Default::default()
        });
        assert!(INIT.is_completed());
    }
}
