use serde::{Deserialize, Serialize};

/// Top-level application settings container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where bookmarks are persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// Path of the SQLite database; `None` means `<data dir>/smartmark.db`.
    pub database_path: Option<String>,
}

/// Sync controller tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSettings {
    /// Deadline applied around the initial bulk fetch.
    pub fetch_timeout_secs: u64,
    /// Buffered events per change-feed receiver before it starts lagging.
    pub change_feed_capacity: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 10,
            change_feed_capacity: 256,
        }
    }
}

/// Log filter used when `RUST_LOG` is not set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
