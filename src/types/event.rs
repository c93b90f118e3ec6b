use serde::{Deserialize, Serialize};

use super::bookmark::Bookmark;

/// A change notification pushed by the backing store for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "UPPERCASE")]
pub enum ChangeEvent {
    Insert { record: Bookmark },
    Update { record: Bookmark },
    Delete { id: String },
}

impl ChangeEvent {
    /// The record key this event refers to.
    pub fn id(&self) -> &str {
        match self {
            ChangeEvent::Insert { record } | ChangeEvent::Update { record } => &record.id,
            ChangeEvent::Delete { id } => id,
        }
    }

    /// Short lowercase label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Insert { .. } => "insert",
            ChangeEvent::Update { .. } => "update",
            ChangeEvent::Delete { .. } => "delete",
        }
    }
}
