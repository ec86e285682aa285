//! Project configuration for `lde`.
//!
//! Read from the file passed via `--config`, or from `lde.toml` in the
//! current directory when it exists. Command-line flags take precedence.
//!
//! # Example
//!
//! ```toml
//! [naming]
//! policy = "camel"
//!
//! [compose]
//! keep_going = true
//! ```

use std::path::Path;

use lde_core::NamingPolicy;
use serde::{Deserialize, Serialize};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG: &str = "lde.toml";

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub naming: NamingSettings,
    #[serde(default)]
    pub compose: ComposeSettings,
}

/// `[naming]` section -- identifier normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamingSettings {
    #[serde(default)]
    pub policy: NamingPolicy,
}

/// `[compose]` section -- session behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposeSettings {
    /// Compose the remaining rules after one fails.
    #[serde(default)]
    pub keep_going: bool,
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// Read and parse a config TOML file from `path`.
pub fn read_config(path: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

/// Loads the explicit config if given, else `lde.toml` if present, else
/// defaults.
pub fn load(explicit: Option<&Path>) -> Result<Config, String> {
    match explicit {
        Some(path) => read_config(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG);
            if default.is_file() {
                read_config(default)
            } else {
                Ok(Config::default())
            }
        }
    }
}
