//! SQLite-backed bookmark store with an in-process change feed.
//!
//! Implements [`BookmarkStore`] on top of `rusqlite`. Every successful write
//! is published on a `tokio::sync::broadcast` channel so that each open
//! session, including the one that issued the write, receives the matching
//! push event.

use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::database::connection::Database;
use crate::services::bookmark_store::{BookmarkStore, ChangeHandler, Subscription};
use crate::types::bookmark::Bookmark;
use crate::types::errors::{FetchError, WriteError};
use crate::types::event::ChangeEvent;

/// Default number of buffered events per subscriber.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct FeedMessage {
    user_id: String,
    event: ChangeEvent,
}

/// Bookmark store backed by a SQLite connection.
pub struct SqliteBookmarkStore {
    db: Mutex<Database>,
    feed: broadcast::Sender<FeedMessage>,
    last_created_at: Mutex<i64>,
}

impl SqliteBookmarkStore {
    /// Wraps an opened database. `feed_capacity` bounds how far a slow
    /// subscriber may fall behind before it starts missing events.
    pub fn new(db: Database, feed_capacity: usize) -> Result<Self, rusqlite::Error> {
        let last: i64 = db.connection().query_row(
            "SELECT COALESCE(MAX(created_at), 0) FROM bookmarks",
            [],
            |row| row.get(0),
        )?;
        let (feed, _) = broadcast::channel(feed_capacity.max(1));
        Ok(Self {
            db: Mutex::new(db),
            feed,
            last_created_at: Mutex::new(last),
        })
    }

    /// Opens (or creates) a store at the given path.
    pub fn open(path: &str, feed_capacity: usize) -> Result<Self, rusqlite::Error> {
        Self::new(Database::open(path)?, feed_capacity)
    }

    /// Opens a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::new(Database::open_in_memory()?, DEFAULT_FEED_CAPACITY)
    }

    /// Changes a bookmark's title and publishes an update event.
    ///
    /// The sync controller has no local update operation; this is how
    /// another client's edit reaches the store.
    pub fn rename(&self, id: &str, title: &str) -> Result<Bookmark, WriteError> {
        let updated = {
            let db = self.db.lock().map_err(|e| WriteError::Backend(e.to_string()))?;
            let conn = db.connection();
            let affected = conn
                .execute("UPDATE bookmarks SET title = ?1 WHERE id = ?2", params![title, id])
                .map_err(|e| WriteError::Backend(e.to_string()))?;
            if affected == 0 {
                return Err(WriteError::NotFound(id.to_string()));
            }
            conn.query_row(
                "SELECT id, user_id, title, url, created_at FROM bookmarks WHERE id = ?1",
                params![id],
                Self::row_to_bookmark,
            )
            .map_err(|e| WriteError::Backend(e.to_string()))?
        };

        self.publish(&updated.user_id, ChangeEvent::Update { record: updated.clone() });
        Ok(updated)
    }

    /// Number of live change-feed subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.feed.receiver_count()
    }

    /// Returns a creation timestamp strictly greater than any handed out before.
    fn next_created_at(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let mut last = match self.last_created_at.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = now.max(*last + 1);
        *last = next;
        next
    }

    fn publish(&self, user_id: &str, event: ChangeEvent) {
        log::debug!("Publishing {} event for bookmark {}", event.kind(), event.id());
        // No receivers is not an error: nobody is watching this user.
        let _ = self.feed.send(FeedMessage {
            user_id: user_id.to_string(),
            event,
        });
    }

    /// Reads a single `Bookmark` row into a struct.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            url: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

#[async_trait]
impl BookmarkStore for SqliteBookmarkStore {
    async fn fetch_all(&self, user_id: &str) -> Result<Vec<Bookmark>, FetchError> {
        let db = self.db.lock().map_err(|e| FetchError::Backend(e.to_string()))?;
        let mut stmt = db
            .connection()
            .prepare(
                "SELECT id, user_id, title, url, created_at FROM bookmarks \
                 WHERE user_id = ?1 ORDER BY created_at DESC",
            )
            .map_err(|e| FetchError::Backend(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id], Self::row_to_bookmark)
            .map_err(|e| FetchError::Backend(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| FetchError::Backend(e.to_string()))?);
        }
        Ok(results)
    }

    async fn create(&self, user_id: &str, title: &str, url: &str) -> Result<Bookmark, WriteError> {
        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            created_at: self.next_created_at(),
        };

        {
            let db = self.db.lock().map_err(|e| WriteError::Backend(e.to_string()))?;
            db.connection()
                .execute(
                    "INSERT INTO bookmarks (id, user_id, title, url, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        bookmark.id,
                        bookmark.user_id,
                        bookmark.title,
                        bookmark.url,
                        bookmark.created_at
                    ],
                )
                .map_err(|e| WriteError::Backend(e.to_string()))?;
        }

        self.publish(user_id, ChangeEvent::Insert { record: bookmark.clone() });
        Ok(bookmark)
    }

    async fn delete(&self, id: &str) -> Result<(), WriteError> {
        let owner = {
            let db = self.db.lock().map_err(|e| WriteError::Backend(e.to_string()))?;
            let conn = db.connection();
            let owner: Option<String> = conn
                .query_row(
                    "SELECT user_id FROM bookmarks WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| WriteError::Backend(e.to_string()))?;
            if owner.is_some() {
                conn.execute("DELETE FROM bookmarks WHERE id = ?1", params![id])
                    .map_err(|e| WriteError::Backend(e.to_string()))?;
            }
            owner
        };

        match owner {
            Some(user_id) => self.publish(&user_id, ChangeEvent::Delete { id: id.to_string() }),
            None => log::debug!("Delete of unknown bookmark {} ignored", id),
        }
        Ok(())
    }

    fn subscribe(&self, user_id: &str, handler: ChangeHandler) -> Subscription {
        let mut rx = self.feed.subscribe();
        let user_id = user_id.to_string();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(msg) => {
                        if msg.user_id == user_id {
                            handler(msg.event);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!(
                            "Change feed for user {} dropped {} events; view is stale until the next fetch",
                            user_id,
                            skipped
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Subscription::new(task)
    }
}
