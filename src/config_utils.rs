//! Configuration file utilities
//!
//! Provides helper functions for reading and writing configuration files.
//! By default config files live in the platform-specific config directory
//! under "upload-records/"; the `_in` variants take an explicit directory.

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "upload-records";

/// Get the config directory path.
///
/// Returns: `~/.config/upload-records` (Linux)
///          `~/Library/Application Support/upload-records` (macOS)
///          `C:\Users\<User>\AppData\Roaming\upload-records` (Windows)
pub fn get_config_dir() -> Result<PathBuf, String> {
    let config_dir = dirs::config_dir()
        .ok_or("Could not find config directory")?;
    Ok(config_dir.join(APP_DIR_NAME))
}

/// Get the directory where log files are written.
///
/// Returns: `~/.upload-records/logs`
pub fn get_logs_dir() -> Result<PathBuf, String> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| "Could not find home directory".to_string())?;
    Ok(home_dir.join(format!(".{}", APP_DIR_NAME)).join("logs"))
}

/// Get the full path to a config file.
pub fn config_file_path(filename: &str) -> Result<PathBuf, String> {
    Ok(get_config_dir()?.join(filename))
}

/// Save data to a config file in the default config directory.
pub fn save_config_file<T: Serialize>(filename: &str, data: &T) -> Result<PathBuf, String> {
    save_config_file_in(&get_config_dir()?, filename, data)
}

/// Load data from a config file in the default config directory.
pub fn load_config_file<T: DeserializeOwned>(filename: &str) -> Result<Option<T>, String> {
    load_config_file_in(&get_config_dir()?, filename)
}

/// Save data to `dir/filename` as pretty JSON, creating `dir` if needed.
///
/// # Returns
/// The path where the file was saved
pub fn save_config_file_in<T: Serialize>(
    dir: &Path,
    filename: &str,
    data: &T,
) -> Result<PathBuf, String> {
    fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create config directory: {}", e))?;
    let config_file = dir.join(filename);

    let json = serde_json::to_string_pretty(data)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    fs::write(&config_file, json)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(config_file)
}

/// Load data from `dir/filename`.
///
/// # Returns
/// * `Ok(Some(data))` if file exists and was parsed successfully
/// * `Ok(None)` if file doesn't exist
/// * `Err(...)` if file exists but couldn't be read/parsed
pub fn load_config_file_in<T: DeserializeOwned>(
    dir: &Path,
    filename: &str,
) -> Result<Option<T>, String> {
    let config_file = dir.join(filename);

    if !config_file.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&config_file)
        .map_err(|e| format!("Failed to read config file: {}", e))?;

    let data = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config file: {}", e))?;

    Ok(Some(data))
}
