//! Configuration: section schemas with embedded defaults, TOML loading and
//! validation.

pub mod macros;
mod schemas;
mod utils;

pub use schemas::*;
pub use utils::{
    get_config_clone, load_config, load_config_from_path, read_config_file, validate, with_config,
    CONFIG, CONFIG_FILE_PATH,
};
