//! Port interfaces implemented by infrastructure clients

use aerointake_domain::{CrmRecordHandle, FieldMap, FileBlob, Result};
use async_trait::async_trait;

/// Identifier of a file in the document store.
pub type RemoteFileId = String;

/// Operations against the CRM record store.
#[async_trait]
pub trait CrmPort: Send + Sync {
    /// Create one record in the named module from a flat field map.
    ///
    /// Single attempt; the caller treats any error here as fatal to the
    /// submission.
    async fn create_record(&self, module: &str, fields: &FieldMap) -> Result<CrmRecordHandle>;

    /// Read the server-populated occurrence identifier of a record.
    ///
    /// Returns `None` while the CRM has not populated the field yet.
    async fn read_occurrence_id(&self, module: &str, record_id: &str) -> Result<Option<String>>;
}

/// Operations against the cloud document store.
#[async_trait]
pub trait DocumentStorePort: Send + Sync {
    /// Upload one file into `parent_id` under `target_name`.
    async fn upload(
        &self,
        file: &FileBlob,
        target_name: &str,
        parent_id: &str,
    ) -> Result<RemoteFileId>;

    /// Request a view-only shareable link for an uploaded file.
    async fn publish_link(&self, remote_id: &str) -> Result<String>;

    /// Create a folder under `parent_id`, returning its id.
    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String>;
}
