/// Component tags for log lines
///
/// Each tag doubles as the debug switch name: `LogTag::Stream` is enabled
/// for debug output by `--debug-stream`.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Cache,
    Broker,
    Scheduler,
    Stream,
    Endpoint,
    Test,
    Other(String),
}

impl LogTag {
    /// Key used by --debug-<key> / --verbose-<key> flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system".to_string(),
            LogTag::Config => "config".to_string(),
            LogTag::Cache => "cache".to_string(),
            LogTag::Broker => "broker".to_string(),
            LogTag::Scheduler => "scheduler".to_string(),
            LogTag::Stream => "stream".to_string(),
            LogTag::Endpoint => "endpoint".to_string(),
            LogTag::Test => "test".to_string(),
            LogTag::Other(name) => name.to_lowercase(),
        }
    }

    /// Uncolored label used in the console prefix and the `log` facade target
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::Cache => "CACHE".to_string(),
            LogTag::Broker => "BROKER".to_string(),
            LogTag::Scheduler => "SCHED".to_string(),
            LogTag::Stream => "STREAM".to_string(),
            LogTag::Endpoint => "ENDPOINT".to_string(),
            LogTag::Test => "TEST".to_string(),
            LogTag::Other(name) => name.to_uppercase(),
        }
    }

    /// Parse a debug key back into a tag
    pub fn from_debug_key(key: &str) -> Self {
        match key.to_lowercase().as_str() {
            "system" => LogTag::System,
            "config" => LogTag::Config,
            "cache" => LogTag::Cache,
            "broker" => LogTag::Broker,
            "scheduler" => LogTag::Scheduler,
            "stream" => LogTag::Stream,
            "endpoint" => LogTag::Endpoint,
            "test" => LogTag::Test,
            other => LogTag::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
