//! In-memory state of the Collection Sync Controller.
//!
//! `CollectionSync` merges three input channels into one view of a user's
//! bookmarks: the initial bulk fetch, local optimistic mutations, and remote
//! change events. Every operation keeps the list unique by `id`, sorted by
//! `created_at` descending, and restricted to the owning user. `id` is the
//! only deduplication key, so whichever of an optimistic insert and its
//! confirming push event arrives first takes the position and the second one
//! replaces it in place.
//!
//! Mutations applied while the initial fetch is in flight are journaled and
//! replayed over the fetched snapshot, so a record the snapshot missed is
//! never lost. Mutations applied before a fetch starts are not journaled:
//! any later snapshot already reflects them.

use std::collections::HashSet;

use crate::types::bookmark::Bookmark;
use crate::types::event::ChangeEvent;

/// Progress of the initial bulk fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    /// No fetch has succeeded and none is running.
    Idle,
    /// A fetch has been started and not yet completed.
    InFlight,
    /// The snapshot has been committed.
    Ready,
}

#[derive(Debug, Clone)]
enum JournalEntry {
    LocalCreate(Bookmark),
    LocalDelete(String),
    Remote(ChangeEvent),
}

/// Ordered, id-unique bookmark list for one signed-in user.
#[derive(Debug, Clone)]
pub struct CollectionSync {
    user_id: String,
    records: Vec<Bookmark>,
    phase: FetchPhase,
    journal: Vec<JournalEntry>,
}

impl CollectionSync {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            records: Vec::new(),
            phase: FetchPhase::Idle,
            journal: Vec::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Current view, newest first.
    pub fn records(&self) -> &[Bookmark] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True once the initial fetch has been committed.
    pub fn is_ready(&self) -> bool {
        self.phase == FetchPhase::Ready
    }

    pub fn phase(&self) -> FetchPhase {
        self.phase
    }

    pub fn get(&self, id: &str) -> Option<&Bookmark> {
        self.records.iter().find(|b| b.id == id)
    }

    /// Marks the initial fetch as started.
    ///
    /// Returns false if a fetch is already running or has completed, in
    /// which case the caller must not fetch again.
    pub fn begin_fetch(&mut self) -> bool {
        if self.phase != FetchPhase::Idle {
            return false;
        }
        self.phase = FetchPhase::InFlight;
        true
    }

    /// Abandons a failed or timed-out fetch so it can be retried.
    ///
    /// The journal is discarded; the retry's snapshot is read after every
    /// change it held.
    pub fn abort_fetch(&mut self) {
        if self.phase == FetchPhase::InFlight {
            self.phase = FetchPhase::Idle;
            self.journal.clear();
        }
    }

    /// Number of changes waiting to be replayed over the fetched snapshot.
    pub fn pending_changes(&self) -> usize {
        self.journal.len()
    }

    /// Replaces the view wholesale with a fetched snapshot and replays every
    /// mutation journaled while the fetch was in flight.
    pub fn complete_fetch(&mut self, fetched: Vec<Bookmark>) {
        let mut seen = HashSet::new();
        let mut records: Vec<Bookmark> = fetched
            .into_iter()
            .filter(|b| self.owns(b))
            .filter(|b| seen.insert(b.id.clone()))
            .collect();
        // Stable: ties keep the store's order.
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.records = records;
        self.phase = FetchPhase::Ready;

        let journal = std::mem::take(&mut self.journal);
        if !journal.is_empty() {
            log::debug!("Replaying {} journaled changes over fetched snapshot", journal.len());
        }
        for entry in journal {
            match entry {
                JournalEntry::LocalCreate(bookmark) => self.upsert(bookmark),
                JournalEntry::LocalDelete(id) => {
                    self.remove(&id);
                }
                JournalEntry::Remote(event) => self.merge_event(event),
            }
        }
    }

    /// Optimistically inserts a bookmark the user just created.
    ///
    /// If the store's insert event already delivered this id, the record is
    /// replaced in place instead of duplicated.
    pub fn apply_local_create(&mut self, bookmark: Bookmark) {
        if !self.owns(&bookmark) {
            return;
        }
        if self.phase == FetchPhase::InFlight {
            self.journal.push(JournalEntry::LocalCreate(bookmark.clone()));
        }
        self.upsert(bookmark);
    }

    /// Optimistically removes a bookmark. Returns the removed record so the
    /// caller can restore it if the delete write fails.
    pub fn apply_local_delete(&mut self, id: &str) -> Option<Bookmark> {
        if self.phase == FetchPhase::InFlight {
            self.journal.push(JournalEntry::LocalDelete(id.to_string()));
        }
        self.remove(id)
    }

    /// Forgets the most recent journaled optimistic delete of `id` after its
    /// delete write failed, so the replay keeps a record the store still holds.
    pub fn cancel_local_delete(&mut self, id: &str) {
        if self.phase != FetchPhase::InFlight {
            return;
        }
        let last = self
            .journal
            .iter()
            .rposition(|entry| matches!(entry, JournalEntry::LocalDelete(pending) if pending == id));
        if let Some(idx) = last {
            self.journal.remove(idx);
        }
    }

    /// Merges one push event from the change subscription.
    pub fn apply_remote_event(&mut self, event: ChangeEvent) {
        if let ChangeEvent::Insert { record } | ChangeEvent::Update { record } = &event {
            if !self.owns(record) {
                return;
            }
        }
        if self.phase == FetchPhase::InFlight {
            self.journal.push(JournalEntry::Remote(event.clone()));
        }
        self.merge_event(event);
    }

    /// Puts back a record removed by [`apply_local_delete`](Self::apply_local_delete)
    /// after its delete write failed.
    ///
    /// While the fetch is in flight this is journaled after the delete, so
    /// the replay cancels it out.
    pub fn restore(&mut self, bookmark: Bookmark) {
        self.apply_local_create(bookmark);
    }

    fn merge_event(&mut self, event: ChangeEvent) {
        match event {
            ChangeEvent::Insert { record } => self.upsert(record),
            ChangeEvent::Update { record } => {
                if let Some(idx) = self.position(&record.id) {
                    self.records[idx] = record;
                    self.reposition(idx);
                } else {
                    log::debug!("Update for absent bookmark {} ignored", record.id);
                }
            }
            ChangeEvent::Delete { id } => {
                self.remove(&id);
            }
        }
    }

    fn owns(&self, bookmark: &Bookmark) -> bool {
        if bookmark.user_id == self.user_id {
            return true;
        }
        log::warn!(
            "Ignoring bookmark {} owned by {} in session for {}",
            bookmark.id,
            bookmark.user_id,
            self.user_id
        );
        false
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|b| b.id == id)
    }

    /// Replaces in place when the id is present, otherwise inserts at the
    /// sorted position.
    fn upsert(&mut self, bookmark: Bookmark) {
        match self.position(&bookmark.id) {
            Some(idx) => {
                self.records[idx] = bookmark;
                self.reposition(idx);
            }
            None => self.insert_sorted(bookmark),
        }
    }

    fn remove(&mut self, id: &str) -> Option<Bookmark> {
        self.position(id).map(|idx| self.records.remove(idx))
    }

    /// Inserts ahead of every record that is not strictly newer.
    fn insert_sorted(&mut self, bookmark: Bookmark) {
        let idx = self.records.partition_point(|b| b.sorts_before(&bookmark));
        self.records.insert(idx, bookmark);
    }

    /// Moves the record at `idx` only if its neighbours now violate the order.
    fn reposition(&mut self, idx: usize) {
        let created_at = self.records[idx].created_at;
        let newer_than_prev = idx > 0 && self.records[idx - 1].created_at < created_at;
        let older_than_next =
            idx + 1 < self.records.len() && self.records[idx + 1].created_at > created_at;
        if newer_than_prev || older_than_next {
            let bookmark = self.records.remove(idx);
            self.insert_sorted(bookmark);
        }
    }
}
