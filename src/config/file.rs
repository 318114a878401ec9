//! TOML settings file loading.
//!
//! The settings file holds the same keys as [`ConfigOverrides`], e.g.
//!
//! ```toml
//! library_id = 12345
//! library_type = "group"
//! citation_style = "chicago-author-date"
//! sort = "dateAdded"
//! ```

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ConfigError, ConfigOverrides};

const APP_DIR: &str = "bibgen";
const FILE_NAME: &str = "config.toml";

/// Default settings file location.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/bibgen/config.toml`
/// 2. `$HOME/.config/bibgen/config.toml`
#[must_use]
pub fn default_settings_path() -> Option<PathBuf> {
    settings_path_from(env_var_non_empty_os("XDG_CONFIG_HOME"), env_var_non_empty_os("HOME"))
}

fn settings_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg_config_home) = xdg_config_home {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join(FILE_NAME));
    }
    let home = home?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the settings file.
///
/// An explicitly given `path` must exist. Without one, the default location
/// is used when a file exists there; otherwise `Ok(None)` is returned.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] when the file
/// cannot be read or is not a valid settings file.
pub fn load_settings_file(path: Option<&Path>) -> Result<Option<ConfigOverrides>, ConfigError> {
    let path = match path {
        Some(explicit) => explicit.to_path_buf(),
        None => match default_settings_path() {
            Some(default) if default.is_file() => default,
            _ => {
                debug!("no settings file found");
                return Ok(None);
            }
        },
    };

    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let overrides = parse_settings(&raw).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "loaded settings file");
    Ok(Some(overrides))
}

fn parse_settings(raw: &str) -> Result<ConfigOverrides, toml::de::Error> {
    toml::from_str(raw)
}
