//! Input checks applied before a bookmark is sent to the store.

use url::Url;

use crate::types::errors::ValidationError;

/// A title/url pair that passed validation, trimmed and ready for `create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
}

/// Validates user input for a new bookmark.
///
/// The title must be non-empty after trimming; the url must parse as an
/// absolute URL with an `http` or `https` scheme. Returns the trimmed values.
pub fn validate_new_bookmark(title: &str, url: &str) -> Result<NewBookmark, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    if !is_web_url(url) {
        return Err(ValidationError::InvalidUrl(url.to_string()));
    }

    Ok(NewBookmark {
        title: title.to_string(),
        url: url.to_string(),
    })
}

/// Returns true if `input` is an absolute http(s) URL.
pub fn is_web_url(input: &str) -> bool {
    match Url::parse(input) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.has_host(),
        Err(_) => false,
    }
}
