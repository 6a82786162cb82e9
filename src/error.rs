//! Error types.
//!
//! Two channels exist:
//!
//! - [`Error`] aborts a command. It is caught once, at the outermost boundary
//!   (`Engine::handle_message`), and rendered as an error record.
//! - [`ErrorList`] collects per-item failures that do not abort anything
//!   (unjoinable records). It travels next to a partial result.

use serde::Serialize;

use crate::Platform;
use crate::record::Record;

/// Fatal command failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// No grammar matched, or the matched (platform, verb) has no handler.
    #[error("Invalid Command: {command}")]
    InvalidCommand { command: String },
    /// A flag-derived value was rejected by the handler that consumes it.
    #[error("Invalid Command Flag: {flag} ({value})")]
    InvalidCommandFlag { flag: &'static str, value: String },
    #[error("Invalid Campaign ID: {0}")]
    InvalidCampaignId(String),
    #[error("No Such Widget Exists: {0}")]
    NoSuchWidget(String),
    /// Raised instead of an [`ErrorList`] entry when joins are strict.
    #[error("Missing Tracker ID Reference: {platform} campaign {id} named '{name}'")]
    UnjoinableRecord { platform: Platform, id: String, name: String },
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("Internal Error: {0}")]
    Internal(String),
}

impl Error {
    /// Short category used in the rendered error record.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidCommand { .. } => "Invalid Command",
            Error::InvalidCommandFlag { .. } => "Invalid Command Flag",
            Error::InvalidCampaignId(_) => "Invalid Campaign ID",
            Error::NoSuchWidget(_) => "No Such Widget",
            Error::UnjoinableRecord { .. } => "Missing Tracker ID Reference",
            Error::Platform(_) => "Platform Error",
            Error::Internal(_) => "Internal Error",
        }
    }
}

/// Failure reported by a platform or tracker client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlatformError {
    #[error("{platform}: APIError {status}: {message}")]
    Api { platform: Platform, status: u16, message: String },
    #[error("{platform}: AuthError: NOT LOGGED IN - Check API-KEYS")]
    Auth { platform: Platform },
    #[error("{platform} does not support {operation}")]
    Unsupported { platform: Platform, operation: &'static str },
    #[error("{platform}: no client configured")]
    NotConfigured { platform: Platform },
}

/// One structured, non-fatal failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

impl ErrorEntry {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorEntry { message: message.into(), id: None, name: None, platform: None }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Mapping view used by the formatter.
    pub fn to_record(&self) -> Record {
        serde_json::to_value(self).ok().and_then(Record::from_value).unwrap_or_default()
    }
}

/// Ordered collection of non-fatal failures. Siblings combine by
/// concatenation; entries are never deduplicated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorList {
    entries: Vec<ErrorEntry>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ErrorEntry) {
        self.entries.push(entry);
    }

    pub fn extend(&mut self, other: ErrorList) {
        self.entries.extend(other.entries);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorEntry> {
        self.entries.iter()
    }

    pub fn to_records(&self) -> Vec<Record> {
        self.entries.iter().map(ErrorEntry::to_record).collect()
    }
}

impl FromIterator<ErrorEntry> for ErrorList {
    fn from_iter<I: IntoIterator<Item = ErrorEntry>>(iter: I) -> Self {
        ErrorList { entries: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_record_skips_missing_fields() {
        let entry = ErrorEntry::new("Missing Tracker ID Reference").with_id("5").with_platform(Platform::Mgid);
        let record = entry.to_record();

        assert_eq!(record.text("message").as_deref(), Some("Missing Tracker ID Reference"));
        assert_eq!(record.text("id").as_deref(), Some("5"));
        assert_eq!(record.text("platform").as_deref(), Some("mgid"));
        assert!(!record.contains("name"));
    }

    #[test]
    fn lists_concatenate_without_dedup() {
        let mut left: ErrorList = [ErrorEntry::new("a")].into_iter().collect();
        let right: ErrorList = [ErrorEntry::new("a"), ErrorEntry::new("b")].into_iter().collect();
        left.extend(right);

        assert_eq!(left.len(), 3);
        assert_eq!(left.iter().map(|e| e.message.as_str()).collect::<Vec<_>>(), ["a", "a", "b"]);
    }
}
