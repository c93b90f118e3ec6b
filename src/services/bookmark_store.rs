//! Backing-store contract for the sync controller.
//!
//! The controller only ever talks to storage through [`BookmarkStore`]: a
//! bulk fetch, a create, a delete, and a push subscription scoped to one
//! user. Implementations are trusted to enforce row ownership.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::types::bookmark::Bookmark;
use crate::types::errors::{FetchError, WriteError};
use crate::types::event::ChangeEvent;

/// Callback invoked for every change event delivered by a subscription.
pub type ChangeHandler = Arc<dyn Fn(ChangeEvent) + Send + Sync + 'static>;

/// Storage operations the sync controller depends on.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Fetches every bookmark owned by `user_id`, newest first.
    async fn fetch_all(&self, user_id: &str) -> Result<Vec<Bookmark>, FetchError>;

    /// Creates a bookmark. The store assigns `id` and `created_at`.
    async fn create(&self, user_id: &str, title: &str, url: &str) -> Result<Bookmark, WriteError>;

    /// Deletes a bookmark by id.
    async fn delete(&self, id: &str) -> Result<(), WriteError>;

    /// Opens a push subscription for changes to `user_id`'s bookmarks.
    ///
    /// Events are handed to `handler` in delivery order until the returned
    /// handle is cancelled or dropped. Must be called within a tokio runtime.
    fn subscribe(&self, user_id: &str, handler: ChangeHandler) -> Subscription;
}

/// Cancellation handle for an open change subscription.
///
/// Cancelling is idempotent; dropping the handle cancels it as well.
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wraps the task that forwards events to the handler.
    pub fn new(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// Stops event delivery. Safe to call more than once.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Returns true while the forwarding task has not been cancelled or finished.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
