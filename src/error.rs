//! Error types shared by the fetch, transform and load stages.

use thiserror::Error;

/// Longest upstream body excerpt carried in an [`EtlError::Upstream`].
const BODY_EXCERPT_LEN: usize = 200;

/// Errors that can abort an ETL run.
///
/// None of these are caught inside the crate; the first one encountered
/// ends the run.
#[derive(Debug, Error)]
pub enum EtlError {
    /// A required setting is missing or cannot be parsed.
    #[error("configuration error: {key}: {reason}")]
    Configuration { key: String, reason: String },

    /// The Census API could not be reached, answered with a non-success
    /// status, or returned a body that is not an array of rows.
    #[error("upstream request to {url} failed: {reason}")]
    Upstream { url: String, reason: String },

    /// Per-year tables disagree on their column labels.
    #[error("column labels differ between tables: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Nothing to concatenate, usually because no years were requested.
    #[error("no tables to combine; at least one year must be requested")]
    EmptyInput,

    /// Writing an object to storage failed.
    #[error("failed to store s3://{bucket}/{key}: {reason}")]
    Storage {
        bucket: String,
        key: String,
        reason: String,
    },

    /// CSV serialization or parsing failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl EtlError {
    pub(crate) fn config(key: &str, reason: impl Into<String>) -> Self {
        EtlError::Configuration {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn upstream(url: impl Into<String>, reason: impl Into<String>) -> Self {
        EtlError::Upstream {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Shortens a response body so it can be carried in an error message.
pub(crate) fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
