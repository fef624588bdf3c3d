//! # Aerointake Domain
//!
//! Pure types for the safety-report intake pipeline: the submission data
//! model, the error taxonomy, and configuration structs. No I/O lives here.

pub mod config;
pub mod errors;
pub mod types;

pub use config::{
    CrmConfig, DocumentStoreConfig, IntakeConfig, ResolverConfig, ServiceCredentials,
    DEFAULT_RESOLVER_INTERVAL_MS, DEFAULT_RESOLVER_MAX_ATTEMPTS, TOKEN_EXPIRY_MARGIN_SECS,
};
pub use errors::{IntakeError, Result};
pub use types::{
    CrmRecordHandle, ExternalService, FieldMap, FileBlob, SubmissionRequest, SubmissionResult,
    UploadOutcome, UploadStatus,
};
