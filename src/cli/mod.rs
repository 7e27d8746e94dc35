pub mod check;
pub mod commands;
pub mod refine;
pub mod render;

pub use commands::{Cli, Commands};

use std::path::Path;
use refurl::config::{parse_config, RefineConfig};
use refurl::errors::RefineError;

/// Config file if given, otherwise built-in defaults.
pub async fn load_config(path: Option<&str>) -> Result<RefineConfig, RefineError> {
    match path {
        Some(path) => parse_config(Path::new(path)).await,
        None => Ok(RefineConfig::default()),
    }
}
