//! App Core for SmartMark.
//!
//! Holds the settings, the bookmark store and at most one signed-in session.

use std::sync::Arc;
use std::time::Duration;

use crate::managers::sync_session::SyncSession;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::sqlite_store::SqliteBookmarkStore;
use crate::types::errors::FetchError;
use crate::types::event::ChangeEvent;
use crate::types::session::SessionUser;

/// Central application struct: configuration, storage and the active session.
pub struct App {
    pub settings_engine: SettingsEngine,
    store: Arc<SqliteBookmarkStore>,
    session: Option<SyncSession>,
}

impl App {
    /// Creates an App from an already loaded settings engine, using its
    /// configured database path.
    pub fn from_settings(settings_engine: SettingsEngine) -> Result<Self, Box<dyn std::error::Error>> {
        let db_path = settings_engine.database_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db_path = db_path.to_string_lossy().to_string();
        Self::open(settings_engine, &db_path)
    }

    fn open(settings_engine: SettingsEngine, db_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let capacity = settings_engine.get_settings().sync.change_feed_capacity;
        let store = SqliteBookmarkStore::open(db_path, capacity)
            .map_err(|e| format!("Failed to open bookmark store at {}: {}", db_path, e))?;
        Ok(Self {
            settings_engine,
            store: Arc::new(store),
            session: None,
        })
    }

    /// Shared handle to the bookmark store.
    pub fn store(&self) -> Arc<SqliteBookmarkStore> {
        Arc::clone(&self.store)
    }

    pub fn session(&self) -> Option<&SyncSession> {
        self.session.as_ref()
    }

    /// Signs `user` in: ends any previous session, subscribes to changes,
    /// then runs the initial fetch under the configured timeout.
    ///
    /// On a fetch failure the new session is discarded and the error is
    /// returned, so the caller never shows an empty list for a failed load.
    pub async fn start_session<F>(&mut self, user: SessionUser, on_event: F) -> Result<&SyncSession, FetchError>
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.end_session();

        let timeout = Duration::from_secs(self.settings_engine.get_settings().sync.fetch_timeout_secs);
        let session = SyncSession::new(user, self.store.clone());
        session.subscribe_to_changes(on_event);
        session.initialize_with_timeout(timeout).await?;

        Ok(self.session.insert(session))
    }

    /// Tears down the active session. Returns false if none was active.
    pub fn end_session(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                session.teardown();
                log::info!("Ended session for {}", session.user().id);
                true
            }
            None => false,
        }
    }
}
