/// Centralized argument handling
///
/// Stores the process arguments once and offers:
/// - Flag presence and flag-value lookups
/// - Per-component debug flag checks
/// - Help text for the `dashsync` binary
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::env;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Override the captured arguments (used by tests and embedding binaries)
pub fn set_cmd_args(args: Vec<String>) {
    *CMD_ARGS.lock() = args;
}

/// Copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    CMD_ARGS.lock().clone()
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Value following a flag, if present
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .filter(|value| !value.starts_with("--"))
        .cloned()
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// =============================================================================

pub fn is_debug_cache_enabled() -> bool {
    has_arg("--debug-cache")
}

pub fn is_debug_broker_enabled() -> bool {
    has_arg("--debug-broker")
}

pub fn is_debug_scheduler_enabled() -> bool {
    has_arg("--debug-scheduler")
}

pub fn is_debug_stream_enabled() -> bool {
    has_arg("--debug-stream")
}

pub fn is_debug_endpoint_enabled() -> bool {
    has_arg("--debug-endpoint")
}

// =============================================================================
// MODE FLAGS
// =============================================================================

pub fn is_help_requested() -> bool {
    has_arg("--help") || has_arg("-h")
}

/// `--config <path>` override for the configuration file
pub fn config_path_override() -> Option<String> {
    get_arg_value("--config")
}

/// `--once <resource>`: fetch a single resource and exit
pub fn once_resource() -> Option<String> {
    get_arg_value("--once")
}

/// Names of the enabled debug flags, for the startup banner
pub fn enabled_debug_flags() -> Vec<String> {
    get_cmd_args()
        .into_iter()
        .filter(|a| a.starts_with("--debug-"))
        .collect()
}

pub fn print_help() {
    println!("dashsync - dashboard data synchronization client");
    println!();
    println!("USAGE:");
    println!("    dashsync [OPTIONS]");
    println!();
    println!("MODES:");
    println!("    (default)              Watch: stream updates and refresh configured resources");
    println!("    --once <resource>      Fetch one resource through the cache and print it");
    println!();
    println!("OPTIONS:");
    println!("    --config <path>        Configuration file (default: data/dashsync.toml)");
    println!("    --quiet                Only log errors");
    println!("    --verbose              Log everything");
    println!("    --log-level <level>    Minimum level: error, warn, info, debug, verbose");
    println!("    --no-color             Plain console output");
    println!("    -h, --help             Print this help");
    println!();
    println!("DEBUG:");
    println!("    --debug-cache          Cache hits, misses and expirations");
    println!("    --debug-broker         Request collapsing");
    println!("    --debug-scheduler      Refresh ticks");
    println!("    --debug-stream         Connection state machine and frames");
    println!("    --debug-endpoint       Outgoing requests");
}
