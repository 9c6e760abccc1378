//! Configuration utilities - loading, validation and access helpers
//!
//! Library types never read this global; they receive their settings from
//! the composition root. The global exists for the binaries only.
use super::schemas::{CacheSettings, Config, EndpointSettings, RefreshSettings, StreamSettings};
use crate::errors::{SyncError, SyncResult};
use crate::logger::{self, LogTag};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::path::Path;

/// Global configuration instance (binary use only)
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/dashsync.toml";

/// Read and validate a configuration file
///
/// A missing file yields the defaults; a malformed or invalid file is an
/// error.
pub fn read_config_file(path: &str) -> SyncResult<Config> {
    let config = if Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("Failed to read config file '{}': {}", path, e)))?;

        let raw = toml::from_str::<toml::Table>(&contents)
            .map_err(|e| SyncError::Config(format!("Failed to parse config file '{}': {}", path, e)))?;
        for key in unknown_keys(&raw) {
            logger::warning(
                LogTag::Config,
                &format!("Unknown setting '{}' in '{}' ignored", key, path),
            );
        }

        toml::from_str::<Config>(&contents)
            .map_err(|e| SyncError::Config(format!("Failed to parse config file '{}': {}", path, e)))?
    } else {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path),
        );
        Config::default()
    };

    validate(&config)?;
    Ok(config)
}

/// Load configuration from a path and initialize the global CONFIG
pub fn load_config_from_path(path: &str) -> SyncResult<()> {
    let config = read_config_file(path)?;

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| SyncError::Config("Config already initialized".to_string()))?;

    logger::info(LogTag::Config, &format!("Configuration loaded from '{}'", path));
    Ok(())
}

/// Load configuration from the default path
pub fn load_config() -> SyncResult<()> {
    load_config_from_path(CONFIG_FILE_PATH)
}

/// Run a closure against the loaded configuration
///
/// Falls back to defaults when nothing was loaded.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get() {
        Some(lock) => f(&*lock.read()),
        None => f(&Config::default()),
    }
}

pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

/// Reject settings the synchronization layer cannot run with
pub fn validate(config: &Config) -> SyncResult<()> {
    if config.cache.ttl_secs == 0 {
        return Err(invalid("cache.ttl_secs", "must be greater than zero"));
    }

    if config.endpoint.request_timeout_secs == 0 {
        return Err(invalid("endpoint.request_timeout_secs", "must be greater than zero"));
    }
    url::Url::parse(&config.endpoint.base_url)
        .map_err(|e| invalid("endpoint.base_url", &e.to_string()))?;

    if config.stream.enabled {
        let address = url::Url::parse(&config.stream.address)
            .map_err(|e| invalid("stream.address", &e.to_string()))?;
        if address.scheme() != "ws" && address.scheme() != "wss" {
            return Err(invalid("stream.address", "scheme must be ws or wss"));
        }
        if config.stream.keepalive_secs == 0 {
            return Err(invalid("stream.keepalive_secs", "must be greater than zero"));
        }
        if config.stream.reconnect_base_secs == 0 {
            return Err(invalid("stream.reconnect_base_secs", "must be greater than zero"));
        }
        if config.stream.reconnect_cap_secs < config.stream.reconnect_base_secs {
            return Err(invalid(
                "stream.reconnect_cap_secs",
                "must not be smaller than reconnect_base_secs",
            ));
        }
    }

    if config.refresh.enabled && config.refresh.interval_secs == 0 {
        return Err(invalid("refresh.interval_secs", "must be greater than zero"));
    }

    Ok(())
}

/// Dotted paths of keys no section declares
fn unknown_keys(raw: &toml::Table) -> Vec<String> {
    let mut unknown = Vec::new();

    for (section, value) in raw {
        let fields = match section.as_str() {
            "endpoint" => EndpointSettings::FIELDS,
            "cache" => CacheSettings::FIELDS,
            "stream" => StreamSettings::FIELDS,
            "refresh" => RefreshSettings::FIELDS,
            _ => {
                unknown.push(section.clone());
                continue;
            }
        };

        if let Some(table) = value.as_table() {
            unknown.extend(
                table
                    .keys()
                    .filter(|key| !fields.contains(&key.as_str()))
                    .map(|key| format!("{}.{}", section, key)),
            );
        }
    }

    unknown
}

fn invalid(field: &str, reason: &str) -> SyncError {
    SyncError::Config(format!("Invalid config field '{}': {}", field, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = read_config_file("definitely/not/here.toml").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.stream.max_reconnect_attempts, 3);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stream]\nkeepalive_secs = 10\n\n[refresh]\nresources = [\"alerts\"]").unwrap();

        let config = read_config_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.stream.keepalive_secs, 10);
        assert_eq!(config.stream.reconnect_base_secs, 5);
        assert_eq!(config.refresh.resources, vec!["alerts".to_string()]);
        assert_eq!(config.cache.ttl_secs, 300);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.cache.ttl_secs = 0;
        assert!(matches!(validate(&config), Err(SyncError::Config(_))));

        let mut config = Config::default();
        config.stream.address = "http://localhost/stream".to_string();
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.stream.enabled = false;
        config.stream.address = String::new();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_unknown_keys_are_reported() {
        let raw: toml::Table = toml::from_str(
            "[stream]\nkeepalive_secs = 10\nkeep_alive = 5\n\n[caching]\nttl = 1\n",
        )
        .unwrap();

        let mut unknown = unknown_keys(&raw);
        unknown.sort();
        assert_eq!(unknown, vec!["caching".to_string(), "stream.keep_alive".to_string()]);
        assert!(Config::FIELDS.contains(&"stream"));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache\nttl_secs = ").unwrap();
        let result = read_config_file(file.path().to_str().unwrap());
        assert!(matches!(result, Err(SyncError::Config(_))));
    }
}
