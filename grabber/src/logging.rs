use std::collections::HashMap;
use std::sync::OnceLock;

use once_cell::sync::Lazy;

pub use tracing::{Level, debug, error, info, trace, warn};

static LOG_CONFIG: OnceLock<LogConfig> = OnceLock::new();
static DEFAULT_CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::default);

/// Per-scope log levels, parsed from an environment variable of the form
/// `"warn,physics=debug,grab=trace"`. Entries without `=` set the global
/// level; unknown level names are ignored.
#[derive(Debug, Clone)]
pub struct LogConfig {
    global_level: Level,
    scope_levels: HashMap<String, Level>,
}

impl LogConfig {
    pub fn new() -> Self {
        Self {
            global_level: Level::WARN,
            scope_levels: HashMap::new(),
        }
    }

    pub fn from_env(env_var_name: &str) -> Self {
        let mut config = Self::new();
        if let Ok(spec) = std::env::var(env_var_name) {
            config.apply(&spec);
        }
        config
    }

    fn apply(&mut self, spec: &str) {
        for entry in spec.split(',') {
            let entry = entry.trim();
            match entry.split_once('=') {
                Some((scope, level)) => {
                    if let Ok(level) = level.trim().parse::<Level>() {
                        self.scope_levels.insert(scope.trim().to_string(), level);
                    }
                }
                None => {
                    if let Ok(level) = entry.parse::<Level>() {
                        self.global_level = level;
                    }
                }
            }
        }
    }

    pub fn should_log(&self, scope: &str, level: Level) -> bool {
        let threshold = self.scope_levels.get(scope).unwrap_or(&self.global_level);
        level <= *threshold
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub fn log_config() -> &'static LogConfig {
    LOG_CONFIG.get().unwrap_or(&DEFAULT_CONFIG)
}

/// Install the tracing subscriber and the scoped log config parsed from
/// `env_var_name`. Safe to call more than once; later calls keep the first
/// config.
pub fn init_logging(env_var_name: &str) -> LogConfig {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let config = LogConfig::from_env(env_var_name);
    LOG_CONFIG.set(config.clone()).ok();
    config
}

/// Scoped logging: emits only when the scope's configured level allows it.
#[macro_export]
macro_rules! scoped_log {
    (trace, $scope:expr, $($arg:tt)*) => {
        if $crate::logging::log_config().should_log($scope, $crate::logging::Level::TRACE) {
            tracing::trace!(scope = $scope, $($arg)*);
        }
    };
    (debug, $scope:expr, $($arg:tt)*) => {
        if $crate::logging::log_config().should_log($scope, $crate::logging::Level::DEBUG) {
            tracing::debug!(scope = $scope, $($arg)*);
        }
    };
    (info, $scope:expr, $($arg:tt)*) => {
        if $crate::logging::log_config().should_log($scope, $crate::logging::Level::INFO) {
            tracing::info!(scope = $scope, $($arg)*);
        }
    };
    (warn, $scope:expr, $($arg:tt)*) => {
        if $crate::logging::log_config().should_log($scope, $crate::logging::Level::WARN) {
            tracing::warn!(scope = $scope, $($arg)*);
        }
    };
    (error, $scope:expr, $($arg:tt)*) => {
        if $crate::logging::log_config().should_log($scope, $crate::logging::Level::ERROR) {
            tracing::error!(scope = $scope, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! grab_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "grab", $($arg)*);
    };
}

#[macro_export]
macro_rules! physics_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "physics", $($arg)*);
    };
}

#[macro_export]
macro_rules! hud_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, "hud", $($arg)*);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_level() {
        let mut config = LogConfig::new();
        config.apply("debug");
        assert!(config.should_log("anything", Level::DEBUG));
        assert!(!config.should_log("anything", Level::TRACE));
    }

    #[test]
    fn parses_scope_levels() {
        let mut config = LogConfig::new();
        config.apply("warn,physics=debug,grab=trace");

        assert!(config.should_log("physics", Level::DEBUG));
        assert!(!config.should_log("physics", Level::TRACE));
        assert!(config.should_log("grab", Level::TRACE));
        assert!(config.should_log("hud", Level::WARN));
        assert!(!config.should_log("hud", Level::INFO));
    }

    #[test]
    fn malformed_entries_are_ignored() {
        let mut config = LogConfig::new();
        config.apply("bogus,grab=nope, physics = info ");

        assert!(!config.should_log("grab", Level::INFO));
        assert!(config.should_log("physics", Level::INFO));
    }
}
