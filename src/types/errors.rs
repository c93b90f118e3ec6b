use std::fmt;

// === FetchError ===

/// Errors raised by the initial bulk fetch of a user's bookmarks.
///
/// A fetch failure is fatal for the session view: callers must show a
/// distinct error state, never an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The backing store failed to answer the query.
    Backend(String),
    /// The fetch did not complete within the caller's deadline.
    Timeout,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Backend(msg) => write!(f, "Failed to fetch bookmarks: {}", msg),
            FetchError::Timeout => write!(f, "Fetching bookmarks timed out"),
        }
    }
}

impl std::error::Error for FetchError {}

// === WriteError ===

/// Errors raised by a create or delete write against the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// The backing store rejected or failed the write.
    Backend(String),
    /// The record targeted by the write does not exist.
    NotFound(String),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::Backend(msg) => write!(f, "Failed to write bookmark: {}", msg),
            WriteError::NotFound(id) => write!(f, "Bookmark not found: {}", id),
        }
    }
}

impl std::error::Error for WriteError {}

// === ValidationError ===

/// Input rejected before any call to the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The title is empty after trimming whitespace.
    EmptyTitle,
    /// The URL is empty after trimming whitespace.
    EmptyUrl,
    /// The URL is not absolute or its scheme is not http/https.
    InvalidUrl(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyTitle => write!(f, "Please enter a bookmark title"),
            ValidationError::EmptyUrl => write!(f, "Please enter a URL"),
            ValidationError::InvalidUrl(_) => write!(
                f,
                "Please enter a valid URL (must start with http:// or https://)"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

// === BookmarkError ===

/// Errors returned by the session's add/delete flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkError {
    /// The input was rejected; nothing was sent to the store.
    Validation(ValidationError),
    /// The store write failed; any optimistic edit has been rolled back.
    Write(WriteError),
}

impl fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookmarkError::Validation(e) => write!(f, "{}", e),
            BookmarkError::Write(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BookmarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BookmarkError::Validation(e) => Some(e),
            BookmarkError::Write(e) => Some(e),
        }
    }
}

impl From<ValidationError> for BookmarkError {
    fn from(e: ValidationError) -> Self {
        BookmarkError::Validation(e)
    }
}

impl From<WriteError> for BookmarkError {
    fn from(e: WriteError) -> Self {
        BookmarkError::Write(e)
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
