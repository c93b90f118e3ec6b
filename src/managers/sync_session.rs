//! Session-scoped Collection Sync Controller.
//!
//! A `SyncSession` is built when a user signs in and dropped when they sign
//! out. It owns the user identity, the store handle, the live subscription
//! and the shared [`CollectionSync`] state. The state mutex is held only for
//! in-memory edits, never across a store call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::managers::collection_sync::CollectionSync;
use crate::services::bookmark_store::{BookmarkStore, ChangeHandler, Subscription};
use crate::services::validation::validate_new_bookmark;
use crate::types::bookmark::Bookmark;
use crate::types::errors::{BookmarkError, FetchError};
use crate::types::event::ChangeEvent;
use crate::types::session::SessionUser;

fn lock(state: &Mutex<CollectionSync>) -> MutexGuard<'_, CollectionSync> {
    // Every operation leaves the list consistent, so a poisoned lock is still usable.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reverts an in-flight fetch if the fetching future is dropped before it
/// commits, so a later `initialize` can run.
struct PendingFetch<'a> {
    state: &'a Mutex<CollectionSync>,
    armed: bool,
}

impl PendingFetch<'_> {
    fn commit(mut self, records: Vec<Bookmark>) {
        self.armed = false;
        lock(self.state).complete_fetch(records);
    }
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.state).abort_fetch();
        }
    }
}

/// Bookmark view and sync lifecycle for one signed-in user.
pub struct SyncSession {
    user: SessionUser,
    store: Arc<dyn BookmarkStore>,
    state: Arc<Mutex<CollectionSync>>,
    subscription: Mutex<Option<Subscription>>,
}

impl SyncSession {
    pub fn new(user: SessionUser, store: Arc<dyn BookmarkStore>) -> Self {
        let state = Arc::new(Mutex::new(CollectionSync::new(user.id.clone())));
        log::info!("Started bookmark session for user {}", user.id);
        Self {
            user,
            store,
            state,
            subscription: Mutex::new(None),
        }
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    /// True once the initial fetch has been committed.
    pub fn is_ready(&self) -> bool {
        lock(&self.state).is_ready()
    }

    /// Copy of the current view, newest first.
    pub fn snapshot(&self) -> Vec<Bookmark> {
        lock(&self.state).records().to_vec()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).is_empty()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(Subscription::is_active)
    }

    /// Fetches the user's bookmarks and commits them as the initial view.
    ///
    /// Runs at most once per session: while a fetch is in flight, or after
    /// one succeeded, this returns `Ok(())` without fetching. A failure
    /// commits nothing and leaves the session able to retry.
    pub async fn initialize(&self) -> Result<(), FetchError> {
        self.fetch(None).await
    }

    /// Like [`initialize`](Self::initialize), treating a fetch that outlives
    /// `timeout` as [`FetchError::Timeout`].
    pub async fn initialize_with_timeout(&self, timeout: Duration) -> Result<(), FetchError> {
        self.fetch(Some(timeout)).await
    }

    async fn fetch(&self, timeout: Option<Duration>) -> Result<(), FetchError> {
        if !lock(&self.state).begin_fetch() {
            log::debug!("Initial fetch for {} already started, skipping", self.user.id);
            return Ok(());
        }
        let pending = PendingFetch {
            state: &self.state,
            armed: true,
        };

        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.store.fetch_all(&self.user.id))
                .await
                .unwrap_or(Err(FetchError::Timeout)),
            None => self.store.fetch_all(&self.user.id).await,
        };

        match result {
            Ok(records) => {
                log::info!("Fetched {} bookmarks for {}", records.len(), self.user.id);
                pending.commit(records);
                Ok(())
            }
            Err(e) => {
                log::warn!("Initial fetch for {} failed: {}", self.user.id, e);
                drop(pending);
                Err(e)
            }
        }
    }

    /// Opens the push subscription for this user.
    ///
    /// Each event is merged into the view, then handed to `on_event` in
    /// delivery order. Returns false without opening a second subscription
    /// if one is already open.
    pub fn subscribe_to_changes<F>(&self, on_event: F) -> bool
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let mut slot = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }

        let state = Arc::clone(&self.state);
        let handler: ChangeHandler = Arc::new(move |event: ChangeEvent| {
            lock(&state).apply_remote_event(event.clone());
            on_event(&event);
        });
        *slot = Some(self.store.subscribe(&self.user.id, handler));
        log::debug!("Subscribed to bookmark changes for {}", self.user.id);
        true
    }

    /// Optimistically shows a bookmark the store has just created.
    pub fn apply_local_create(&self, bookmark: Bookmark) {
        lock(&self.state).apply_local_create(bookmark);
    }

    /// Optimistically hides a bookmark; returns it for rollback.
    pub fn apply_local_delete(&self, id: &str) -> Option<Bookmark> {
        lock(&self.state).apply_local_delete(id)
    }

    /// Merges a change event delivered outside the session's own subscription.
    pub fn apply_remote_event(&self, event: ChangeEvent) {
        lock(&self.state).apply_remote_event(event);
    }

    /// Validates input, creates the bookmark in the store and shows it.
    ///
    /// Nothing is applied locally unless the write succeeds.
    pub async fn add_bookmark(&self, title: &str, url: &str) -> Result<Bookmark, BookmarkError> {
        let input = validate_new_bookmark(title, url)?;

        let created = self
            .store
            .create(&self.user.id, &input.title, &input.url)
            .await
            .map_err(|e| {
                log::warn!("Failed to add bookmark for {}: {}", self.user.id, e);
                e
            })?;

        self.apply_local_create(created.clone());
        Ok(created)
    }

    /// Hides the bookmark immediately, then deletes it in the store.
    ///
    /// If the write fails the bookmark is put back where it was and the
    /// error is returned.
    pub async fn delete_bookmark(&self, id: &str) -> Result<(), BookmarkError> {
        let removed = self.apply_local_delete(id);

        if let Err(e) = self.store.delete(id).await {
            log::warn!("Failed to delete bookmark {}: {}", id, e);
            let mut state = lock(&self.state);
            state.cancel_local_delete(id);
            if let Some(bookmark) = removed {
                state.restore(bookmark);
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Cancels the change subscription. Safe to call repeatedly, before any
    /// subscription was opened, and while `initialize` is pending.
    pub fn teardown(&self) {
        let taken = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut subscription) = taken {
            subscription.cancel();
            log::info!("Closed bookmark subscription for {}", self.user.id);
        }
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
