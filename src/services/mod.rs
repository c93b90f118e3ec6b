// SmartMark services
// Services provide the backing store, validation, formatting and settings.

pub mod bookmark_store;
pub mod formatting;
pub mod settings_engine;
pub mod sqlite_store;
pub mod validation;
