// SmartMark platform abstraction
// Platform-specific config and data directories, selected at compile time.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Application directory name used on every platform.
pub const APP_DIR_NAME: &str = "smartmark";

/// Returns the directory holding `settings.json`.
///
/// - **Linux**: `$XDG_CONFIG_HOME/smartmark` or `~/.config/smartmark`
/// - **macOS**: `~/Library/Application Support/smartmark`
/// - **Windows**: `%APPDATA%/smartmark`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the directory holding the bookmark database.
///
/// - **Linux**: `$XDG_DATA_HOME/smartmark` or `~/.local/share/smartmark`
/// - **macOS**: `~/Library/Application Support/smartmark`
/// - **Windows**: `%APPDATA%/smartmark`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}
