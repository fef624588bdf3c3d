//! Error types used throughout the pipeline
//!
//! The taxonomy mirrors the stage structure of a submission: auth and CRM
//! errors abort the whole submission, everything downstream is degraded to
//! a warning or a per-file failure marker by the orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the intake pipeline.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum IntakeError {
    /// Required credential missing from configuration. No retry.
    #[error("Auth configuration error: {0}")]
    AuthConfig(String),

    /// The token endpoint rejected the refresh-token exchange.
    #[error("Auth exchange rejected: {0}")]
    AuthExchange(String),

    /// The CRM rejected the record payload. Remote code, message and
    /// details are preserved verbatim for diagnostics.
    #[error("CRM rejected submission [{code}]: {message}")]
    CrmSubmission { code: String, message: String, details: serde_json::Value },

    /// Network-level failure talking to the CRM.
    #[error("CRM transport error: {0}")]
    CrmTransport(String),

    /// A single attachment failed to upload. Never aborts the batch.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// A share-link request failed. Recorded as a missing link.
    #[error("Share link request failed: {0}")]
    LinkPublish(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntakeError {
    /// Whether this error aborts the whole submission.
    ///
    /// Only the system-of-record stage (CRM create) and the auth path that
    /// feeds it are fatal; every other stage degrades.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AuthConfig(_)
                | Self::AuthExchange(_)
                | Self::CrmSubmission { .. }
                | Self::CrmTransport(_)
        )
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, IntakeError>;
