//! Configuration file discovery and output folder resolution

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the output folder
pub const OUTPUT_FOLDER_ENV: &str = "DUET_OUTPUT_FOLDER";

/// Locate the TOML configuration file
///
/// An explicitly requested path must exist. Without one, the platform
/// default locations are tried:
/// - Linux: `~/.config/duet/config.toml`, then `/etc/duet/config.toml`
/// - macOS / Windows: `<config dir>/duet/config.toml`
///
/// Returns `Ok(None)` when no default file exists.
pub fn locate_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(Error::NotFound(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let user_config = dirs::config_dir().map(|d| d.join("duet").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Ok(Some(path));
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/duet/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }
    }

    Ok(None)
}

/// Load a TOML configuration, falling back to defaults when no file exists
///
/// A missing default file is not an error: a warning is logged and
/// `T::default()` is returned. A file that exists but fails to parse is a
/// `Config` error.
pub fn load_toml<T>(explicit: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match locate_config_file(explicit)? {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse {}: {}", path.display(), e))
            })
        }
        None => {
            warn!("No configuration file found, using built-in defaults");
            Ok(T::default())
        }
    }
}

/// Resolve the output folder
///
/// Priority order:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. TOML config file value
/// 4. OS-dependent default
pub fn resolve_output_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config_file_value: Option<&Path>,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = config_file_value {
        return path.to_path_buf();
    }

    default_output_folder()
}

/// OS-dependent default output folder
fn default_output_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("duet").join("outputs"))
        .unwrap_or_else(|| PathBuf::from("./duet_outputs"))
}
