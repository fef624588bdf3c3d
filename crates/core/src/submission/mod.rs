//! Submission orchestration
//!
//! One submission moves through a fixed sequence of stages. The failure
//! policy is asymmetric: the CRM create is the system of record and aborts
//! the submission on any error, while every downstream stage (occurrence-id
//! resolution, uploads, share links) degrades to warnings or per-file
//! markers and the pipeline keeps moving.

mod service;

pub use service::SubmissionService;

/// Stages a submission moves through.
///
/// `Aborted` is reachable only from `Pending`, triggered by a CRM-stage
/// error; there is no failed terminal state from `RecordCreated` onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Pending,
    RecordCreated,
    IdResolved,
    IdUnresolved,
    FilesProcessed,
    Completed,
    Aborted,
}

impl SubmissionStage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::RecordCreated => "record_created",
            Self::IdResolved => "id_resolved",
            Self::IdUnresolved => "id_unresolved",
            Self::FilesProcessed => "files_processed",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}
