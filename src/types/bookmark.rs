use serde::{Deserialize, Serialize};

/// A saved bookmark, as stored by the backing store and held by the sync
/// controller. `created_at` is milliseconds since the UNIX epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub url: String,
    pub created_at: i64,
}

impl Bookmark {
    /// Returns true when `self` must be listed before `other` (newest first).
    pub fn sorts_before(&self, other: &Bookmark) -> bool {
        self.created_at > other.created_at
    }
}
