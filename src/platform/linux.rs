// Linux paths follow the XDG base directory layout.

use std::env;
use std::path::PathBuf;

use super::APP_DIR_NAME;

fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    match env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir).join(APP_DIR_NAME),
        _ => {
            let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
            let mut path = PathBuf::from(home);
            path.extend(fallback);
            path.join(APP_DIR_NAME)
        }
    }
}

pub fn get_config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", &[".config"])
}

pub fn get_data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", &[".local", "share"])
}
