//! # Aerointake Core
//!
//! The submission orchestration pipeline: port traits for the two external
//! services, the occurrence-id poll helper, and the `SubmissionService`
//! state machine. Pure async logic; every piece of I/O lives behind the
//! ports implemented in `aerointake-infra`.

pub mod poll;
pub mod ports;
pub mod submission;

pub use poll::{poll_until, PollPolicy};
pub use ports::{CrmPort, DocumentStorePort, RemoteFileId};
pub use submission::{SubmissionService, SubmissionStage};
