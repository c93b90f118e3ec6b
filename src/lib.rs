//! SmartMark: a minimal personal bookmark manager with real-time sync.
//!
//! The core is the collection sync controller in [`managers`]: it merges the
//! initial fetch, optimistic local edits and pushed change events into one
//! ordered, duplicate-free view of a user's bookmarks.

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
