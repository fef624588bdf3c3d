//! Core data types of the submission pipeline

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// External services the pipeline authenticates against. Each one gets its
/// own cached bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalService {
    Crm,
    DocumentStore,
}

impl ExternalService {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crm => "crm",
            Self::DocumentStore => "document_store",
        }
    }
}

impl fmt::Display for ExternalService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat field map sent to the CRM as-is; no field translation happens in
/// the pipeline.
pub type FieldMap = Map<String, Value>;

/// A single attachment handed to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileBlob {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A validated report ready for submission. Immutable once handed to the
/// orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub form_type: String,
    pub fields: FieldMap,
    #[serde(default)]
    pub attachments: Vec<FileBlob>,
}

/// Handle to a record created in a CRM module. Created once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmRecordHandle {
    pub module: String,
    pub record_id: String,
}

/// Terminal status of one attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Uploaded,
    Failed,
}

/// Outcome for one attachment, independent of every other attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub file_name: String,
    pub remote_id: Option<String>,
    pub share_link: Option<String>,
    pub status: UploadStatus,
    /// Text of the error that failed the upload, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadOutcome {
    #[must_use]
    pub fn uploaded(file_name: String, remote_id: String) -> Self {
        Self {
            file_name,
            remote_id: Some(remote_id),
            share_link: None,
            status: UploadStatus::Uploaded,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(file_name: String, error: String) -> Self {
        Self {
            file_name,
            remote_id: None,
            share_link: None,
            status: UploadStatus::Failed,
            error: Some(error),
        }
    }
}

/// The only externally observed output of the pipeline.
///
/// `success` reflects the CRM stage alone; degraded (but not failed)
/// completion of the downstream stages surfaces through `warnings`.
/// `uploads` always has one entry per attachment, index-aligned with the
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub success: bool,
    pub record_id: Option<String>,
    pub occurrence_id: Option<String>,
    pub uploads: Vec<UploadOutcome>,
    pub warnings: Vec<String>,
}

impl SubmissionResult {
    /// A submission aborted before the record was created.
    #[must_use]
    pub fn aborted(warning: String) -> Self {
        Self {
            success: false,
            record_id: None,
            occurrence_id: None,
            uploads: Vec::new(),
            warnings: vec![warning],
        }
    }

    /// Completed, but with at least one downstream stage degraded.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.success && !self.warnings.is_empty()
    }
}
