//! Error types for narrative generation.

use thiserror::Error;

/// Errors that can occur while generating names or narratives.
#[derive(Error, Debug)]
pub enum NarrativeError {
    /// Transport error talking to the completion service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The completion service answered with a non-success status.
    #[error("Completion API returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// The completion service answered with an unexpected payload.
    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    /// The completion text is not valid JSON.
    #[error("Invalid JSON in completion: {0}")]
    Json(#[from] serde_json::Error),

    /// The completion JSON lacks a required string field.
    #[error("Completion JSON is missing the '{0}' field")]
    MissingField(&'static str),

    /// The generated full name is already taken by another record.
    #[error("Name '{0}' has already been used")]
    DuplicateName(String),

    /// Every attempt failed.
    #[error("Gave up after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: u32,
        last_error: Box<NarrativeError>,
    },
}
