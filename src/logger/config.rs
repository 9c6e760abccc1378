/// Logger configuration, built from command-line flags
///
/// Recognised flags:
/// - `--debug-<component>`: enable Debug lines for one tag
/// - `--verbose`: enable Verbose lines for every tag
/// - `--verbose-<component>`: enable Verbose lines for one tag
/// - `--quiet`: only errors
/// - `--log-level <level>`: explicit minimum level
/// - `--no-color`: plain console output
use super::levels::LogLevel;
use super::tags::LogTag;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    /// Tags with Debug output enabled (debug keys)
    pub debug_tags: HashSet<String>,
    /// Tags with Verbose output enabled (debug keys)
    pub verbose_tags: HashSet<String>,
    /// --verbose: Verbose lines for every tag
    pub verbose_all: bool,
    /// If non-empty, only these tags are shown (errors excepted)
    pub enabled_tags: HashSet<String>,
    pub use_colors: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
            verbose_all: false,
            enabled_tags: HashSet::new(),
            use_colors: true,
        }
    }
}

impl LoggerConfig {
    /// Build a configuration from an argument list
    pub fn from_args(args: &[String]) -> Self {
        let mut config = LoggerConfig::default();

        let mut iter = args.iter().peekable();
        while let Some(arg) = iter.next() {
            if arg == "--verbose" {
                config.verbose_all = true;
                config.min_level = LogLevel::Verbose;
            } else if arg == "--quiet" {
                config.min_level = LogLevel::Error;
            } else if arg == "--no-color" {
                config.use_colors = false;
            } else if arg == "--log-level" {
                if let Some(level) = iter.peek().and_then(|value| LogLevel::from_str(value)) {
                    config.min_level = level;
                    iter.next();
                }
            } else if let Some(key) = arg.strip_prefix("--debug-") {
                config.debug_tags.insert(key.to_lowercase());
            } else if let Some(key) = arg.strip_prefix("--verbose-") {
                config.verbose_tags.insert(key.to_lowercase());
            }
        }

        // Debug tags only show if the threshold lets Debug through
        if (!config.debug_tags.is_empty() || !config.verbose_tags.is_empty())
            && config.min_level != LogLevel::Error
        {
            config.min_level = LogLevel::Verbose;
        }

        config
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

/// Configure the logger from the process arguments
pub fn init_from_args() {
    let args = crate::arguments::get_cmd_args();
    set_logger_config(LoggerConfig::from_args(&args));
}

pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().debug_tags.contains(&tag.to_debug_key())
}

pub fn is_verbose_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().verbose_tags.contains(&tag.to_debug_key())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_debug_flags_enable_tags() {
        let config = LoggerConfig::from_args(&args(&["dashsync", "--debug-stream", "--debug-broker"]));
        assert!(config.debug_tags.contains("stream"));
        assert!(config.debug_tags.contains("broker"));
        assert!(!config.debug_tags.contains("cache"));
        assert_eq!(config.min_level, LogLevel::Verbose);
    }

    #[test]
    fn test_quiet_and_level() {
        let quiet = LoggerConfig::from_args(&args(&["dashsync", "--quiet"]));
        assert_eq!(quiet.min_level, LogLevel::Error);

        let warn = LoggerConfig::from_args(&args(&["dashsync", "--log-level", "warn"]));
        assert_eq!(warn.min_level, LogLevel::Warning);

        let plain = LoggerConfig::from_args(&args(&["dashsync", "--no-color"]));
        assert!(!plain.use_colors);
        assert_eq!(plain.min_level, LogLevel::Info);
    }
}
