// SmartMark state managers
// Managers own the in-memory bookmark view and the per-user sync session.

pub mod collection_sync;
pub mod sync_session;
