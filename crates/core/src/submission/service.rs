use std::sync::Arc;

use aerointake_domain::{SubmissionRequest, SubmissionResult, UploadOutcome};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::SubmissionStage;
use crate::poll::{poll_until, PollPolicy};
use crate::ports::{CrmPort, DocumentStorePort};

/// Orchestrates one submission end to end.
///
/// Stage order is fixed: CRM create, occurrence-id resolution, attachment
/// uploads, share links. Uploads run sequentially in input order to stay
/// under external rate limits and keep result ordering deterministic; the
/// result sequence is index-aligned with the attachments regardless of
/// individual failures.
pub struct SubmissionService {
    crm: Arc<dyn CrmPort>,
    documents: Arc<dyn DocumentStorePort>,
    module: String,
    root_folder_id: String,
    poll_policy: PollPolicy,
}

impl SubmissionService {
    pub fn new(
        crm: Arc<dyn CrmPort>,
        documents: Arc<dyn DocumentStorePort>,
        module: String,
        root_folder_id: String,
        poll_policy: PollPolicy,
    ) -> Self {
        Self { crm, documents, module, root_folder_id, poll_policy }
    }

    /// Run the pipeline for one validated request.
    ///
    /// Always returns a structured result; stage-level detail (polling,
    /// per-file failures) surfaces only through `warnings` and the upload
    /// outcomes, never as a raw error.
    pub async fn submit(&self, request: &SubmissionRequest) -> SubmissionResult {
        let submission_id = Uuid::new_v4();
        let mut stage = SubmissionStage::Pending;
        let mut warnings: Vec<String> = Vec::new();

        info!(
            %submission_id,
            stage = stage.as_str(),
            form_type = %request.form_type,
            attachments = request.attachments.len(),
            "submission started"
        );

        // System of record: any error here aborts the whole submission.
        let handle = match self.crm.create_record(&self.module, &request.fields).await {
            Ok(handle) => handle,
            Err(err) => {
                stage = SubmissionStage::Aborted;
                warn!(%submission_id, stage = stage.as_str(), error = %err, "CRM record creation failed");
                return SubmissionResult::aborted(err.to_string());
            }
        };
        stage = SubmissionStage::RecordCreated;
        info!(%submission_id, stage = stage.as_str(), record_id = %handle.record_id, "CRM record created");

        // The occurrence id is populated asynchronously by the CRM; its
        // absence is a warning, never a failure.
        let occurrence_id = {
            let crm = Arc::clone(&self.crm);
            let module = self.module.clone();
            let record_id = handle.record_id.clone();
            poll_until(self.poll_policy, move |attempt| {
                let crm = Arc::clone(&crm);
                let module = module.clone();
                let record_id = record_id.clone();
                async move {
                    debug!(attempt, %record_id, "polling for occurrence id");
                    crm.read_occurrence_id(&module, &record_id).await
                }
            })
            .await
        };

        stage = match occurrence_id.as_deref() {
            Some(id) => {
                info!(%submission_id, occurrence_id = %id, "occurrence id resolved");
                SubmissionStage::IdResolved
            }
            None => {
                warnings.push(format!(
                    "occurrence id for record {} could not be resolved",
                    handle.record_id
                ));
                SubmissionStage::IdUnresolved
            }
        };
        debug!(%submission_id, stage = stage.as_str(), "stage transition");

        let uploads = if request.attachments.is_empty() {
            Vec::new()
        } else {
            let parent_id = self
                .resolve_parent_folder(submission_id, occurrence_id.as_deref(), &mut warnings)
                .await;
            self.process_attachments(submission_id, request, &parent_id, &mut warnings).await
        };
        stage = SubmissionStage::FilesProcessed;
        debug!(%submission_id, stage = stage.as_str(), "stage transition");

        stage = SubmissionStage::Completed;
        info!(
            %submission_id,
            stage = stage.as_str(),
            record_id = %handle.record_id,
            warnings = warnings.len(),
            "submission completed"
        );

        SubmissionResult {
            success: true,
            record_id: Some(handle.record_id),
            occurrence_id,
            uploads,
            warnings,
        }
    }

    /// Pick the folder attachments land in: one named after the occurrence
    /// id when it resolved, the configured root otherwise. Folder creation
    /// is best-effort; on failure uploads fall back to the root.
    async fn resolve_parent_folder(
        &self,
        submission_id: Uuid,
        occurrence_id: Option<&str>,
        warnings: &mut Vec<String>,
    ) -> String {
        let Some(occurrence_id) = occurrence_id else {
            return self.root_folder_id.clone();
        };

        match self.documents.create_folder(occurrence_id, &self.root_folder_id).await {
            Ok(folder_id) => {
                debug!(%submission_id, folder = %occurrence_id, %folder_id, "submission folder created");
                folder_id
            }
            Err(err) => {
                warn!(%submission_id, folder = %occurrence_id, error = %err, "folder creation failed, uploading to root");
                warnings.push(format!("could not create folder '{occurrence_id}': {err}"));
                self.root_folder_id.clone()
            }
        }
    }

    /// Upload every attachment in input order, then request share links for
    /// the uploaded subset. One outcome per attachment; a failure for one
    /// file never aborts the rest.
    async fn process_attachments(
        &self,
        submission_id: Uuid,
        request: &SubmissionRequest,
        parent_id: &str,
        warnings: &mut Vec<String>,
    ) -> Vec<UploadOutcome> {
        let suffix = name_suffix(submission_id);
        let mut uploads = Vec::with_capacity(request.attachments.len());

        for (index, file) in request.attachments.iter().enumerate() {
            let target_name = disambiguated_name(&file.file_name, &suffix);
            match self.documents.upload(file, &target_name, parent_id).await {
                Ok(remote_id) => {
                    debug!(%submission_id, index, file = %file.file_name, %remote_id, "attachment uploaded");
                    uploads.push(UploadOutcome::uploaded(file.file_name.clone(), remote_id));
                }
                Err(err) => {
                    warn!(%submission_id, index, file = %file.file_name, error = %err, "attachment upload failed");
                    warnings.push(format!("upload of '{}' failed: {err}", file.file_name));
                    uploads.push(UploadOutcome::failed(file.file_name.clone(), err.to_string()));
                }
            }
        }

        // Share links only for files that actually made it; failed uploads
        // are skipped, not retried.
        for outcome in &mut uploads {
            let Some(remote_id) = outcome.remote_id.clone() else { continue };
            match self.documents.publish_link(&remote_id).await {
                Ok(link) => outcome.share_link = Some(link),
                Err(err) => {
                    warn!(%submission_id, file = %outcome.file_name, error = %err, "share link unavailable");
                    warnings.push(format!(
                        "share link for '{}' unavailable: {err}",
                        outcome.file_name
                    ));
                }
            }
        }

        uploads
    }
}

/// First fragment of the submission id, used to disambiguate upload names.
fn name_suffix(submission_id: Uuid) -> String {
    submission_id.simple().to_string().chars().take(8).collect()
}

/// `report.pdf` + `1a2b3c4d` becomes `report_1a2b3c4d.pdf`; collisions in
/// the store are avoided instead of overwritten.
fn disambiguated_name(file_name: &str, suffix: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{suffix}.{ext}"),
        _ => format!("{file_name}_{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use aerointake_domain::{
        CrmRecordHandle, FieldMap, FileBlob, IntakeError, Result, UploadStatus,
    };
    use async_trait::async_trait;

    use super::*;

    struct StubCrm {
        create_error: Option<IntakeError>,
        record_id: String,
        occurrence_reads: Mutex<VecDeque<Result<Option<String>>>>,
        create_calls: AtomicU32,
        read_calls: AtomicU32,
    }

    impl StubCrm {
        fn succeeding(record_id: &str, reads: Vec<Result<Option<String>>>) -> Self {
            Self {
                create_error: None,
                record_id: record_id.to_string(),
                occurrence_reads: Mutex::new(reads.into()),
                create_calls: AtomicU32::new(0),
                read_calls: AtomicU32::new(0),
            }
        }

        fn rejecting(error: IntakeError) -> Self {
            Self {
                create_error: Some(error),
                record_id: String::new(),
                occurrence_reads: Mutex::new(VecDeque::new()),
                create_calls: AtomicU32::new(0),
                read_calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl CrmPort for StubCrm {
        async fn create_record(&self, module: &str, _fields: &FieldMap) -> Result<CrmRecordHandle> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            match &self.create_error {
                Some(err) => Err(err.clone()),
                None => Ok(CrmRecordHandle {
                    module: module.to_string(),
                    record_id: self.record_id.clone(),
                }),
            }
        }

        async fn read_occurrence_id(
            &self,
            _module: &str,
            _record_id: &str,
        ) -> Result<Option<String>> {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            self.occurrence_reads
                .lock()
                .expect("mutex poisoned")
                .pop_front()
                .unwrap_or(Ok(None))
        }
    }

    struct StubDocs {
        fail_uploads_for: Vec<String>,
        fail_links_for: Vec<String>,
        fail_folders: bool,
        upload_calls: AtomicU32,
        link_calls: AtomicU32,
        folder_calls: AtomicU32,
        uploaded_names: Mutex<Vec<(String, String)>>,
    }

    impl StubDocs {
        fn new() -> Self {
            Self {
                fail_uploads_for: Vec::new(),
                fail_links_for: Vec::new(),
                fail_folders: false,
                upload_calls: AtomicU32::new(0),
                link_calls: AtomicU32::new(0),
                folder_calls: AtomicU32::new(0),
                uploaded_names: Mutex::new(Vec::new()),
            }
        }

        fn failing_uploads(names: &[&str]) -> Self {
            Self {
                fail_uploads_for: names.iter().map(|n| n.to_string()).collect(),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl DocumentStorePort for StubDocs {
        async fn upload(
            &self,
            file: &FileBlob,
            target_name: &str,
            parent_id: &str,
        ) -> Result<String> {
            self.upload_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_uploads_for.contains(&file.file_name) {
                return Err(IntakeError::Upload(format!("rejected '{}'", file.file_name)));
            }
            self.uploaded_names
                .lock()
                .expect("mutex poisoned")
                .push((target_name.to_string(), parent_id.to_string()));
            Ok(format!("remote-{target_name}"))
        }

        async fn publish_link(&self, remote_id: &str) -> Result<String> {
            self.link_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_links_for.iter().any(|name| remote_id.contains(name.as_str())) {
                return Err(IntakeError::LinkPublish(format!("no link for '{remote_id}'")));
            }
            Ok(format!("https://docs.example/l/{remote_id}"))
        }

        async fn create_folder(&self, name: &str, _parent_id: &str) -> Result<String> {
            self.folder_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_folders {
                return Err(IntakeError::Upload("folder quota exceeded".into()));
            }
            Ok(format!("folder-{name}"))
        }
    }

    fn service(crm: Arc<StubCrm>, docs: Arc<StubDocs>) -> SubmissionService {
        SubmissionService::new(
            crm,
            docs,
            "Safety_Reports".to_string(),
            "root-folder".to_string(),
            PollPolicy::new(3, Duration::ZERO),
        )
    }

    fn request_with(attachments: Vec<FileBlob>) -> SubmissionRequest {
        let mut fields = FieldMap::new();
        fields.insert("Name1".into(), "John".into());
        fields.insert("Last_Name".into(), "Smith".into());
        SubmissionRequest { form_type: "complaint".into(), fields, attachments }
    }

    fn blob(name: &str) -> FileBlob {
        FileBlob {
            file_name: name.to_string(),
            content_type: "application/octet-stream".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn clean_submission_without_attachments() {
        let crm = Arc::new(StubCrm::succeeding("ABC123", vec![Ok(Some("OCC-0099".into()))]));
        let docs = Arc::new(StubDocs::new());
        let result = service(Arc::clone(&crm), Arc::clone(&docs)).submit(&request_with(vec![])).await;

        assert!(result.success);
        assert_eq!(result.record_id.as_deref(), Some("ABC123"));
        assert_eq!(result.occurrence_id.as_deref(), Some("OCC-0099"));
        assert!(result.uploads.is_empty());
        assert!(result.warnings.is_empty());
        // No attachments means the document store is never touched.
        assert_eq!(docs.folder_calls.load(Ordering::SeqCst), 0);
        assert_eq!(docs.upload_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn crm_rejection_aborts_before_any_document_call() {
        let crm = Arc::new(StubCrm::rejecting(IntakeError::CrmSubmission {
            code: "MANDATORY_NOT_FOUND".into(),
            message: "required field missing".into(),
            details: serde_json::Value::Null,
        }));
        let docs = Arc::new(StubDocs::new());
        let result = service(Arc::clone(&crm), Arc::clone(&docs))
            .submit(&request_with(vec![blob("report.pdf")]))
            .await;

        assert!(!result.success);
        assert!(result.record_id.is_none());
        assert!(result.uploads.is_empty());
        assert!(result.warnings.iter().any(|w| w.contains("MANDATORY_NOT_FOUND")));
        assert_eq!(crm.read_calls.load(Ordering::SeqCst), 0);
        assert_eq!(docs.folder_calls.load(Ordering::SeqCst), 0);
        assert_eq!(docs.upload_calls.load(Ordering::SeqCst), 0);
        assert_eq!(docs.link_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn crm_transport_error_aborts_the_submission() {
        let crm = Arc::new(StubCrm::rejecting(IntakeError::CrmTransport("connection reset".into())));
        let docs = Arc::new(StubDocs::new());
        let result =
            service(crm, Arc::clone(&docs)).submit(&request_with(vec![blob("a.txt")])).await;

        assert!(!result.success);
        assert!(result.warnings.iter().any(|w| w.contains("connection reset")));
        assert_eq!(docs.upload_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn one_failed_upload_leaves_the_rest_of_the_batch_intact() {
        let crm = Arc::new(StubCrm::succeeding("ABC123", vec![Ok(Some("OCC-0001".into()))]));
        let docs = Arc::new(StubDocs::failing_uploads(&["broken.bin"]));
        let attachments = vec![blob("first.pdf"), blob("broken.bin"), blob("third.png")];
        let result =
            service(crm, Arc::clone(&docs)).submit(&request_with(attachments)).await;

        assert!(result.success);
        assert_eq!(result.uploads.len(), 3);
        assert_eq!(result.uploads[0].status, UploadStatus::Uploaded);
        assert_eq!(result.uploads[1].status, UploadStatus::Failed);
        assert_eq!(result.uploads[2].status, UploadStatus::Uploaded);
        // Index alignment with the input, regardless of status.
        assert_eq!(result.uploads[1].file_name, "broken.bin");
        assert!(result.uploads[1].error.as_deref().unwrap_or("").contains("broken.bin"));
        // Links requested only for the uploaded subset.
        assert_eq!(docs.link_calls.load(Ordering::SeqCst), 2);
        assert!(result.uploads[0].share_link.is_some());
        assert!(result.uploads[1].share_link.is_none());
        assert!(result.uploads[2].share_link.is_some());
        assert!(result.warnings.iter().any(|w| w.contains("broken.bin")));
    }

    #[tokio::test]
    async fn unresolved_occurrence_id_degrades_to_root_folder_upload() {
        let crm = Arc::new(StubCrm::succeeding("ABC123", vec![Ok(None), Ok(None), Ok(None)]));
        let docs = Arc::new(StubDocs::new());
        let result = service(Arc::clone(&crm), Arc::clone(&docs))
            .submit(&request_with(vec![blob("report.pdf")]))
            .await;

        assert!(result.success);
        assert!(result.occurrence_id.is_none());
        assert!(result.is_degraded());
        assert!(result.warnings.iter().any(|w| w.contains("could not be resolved")));
        // Polling honoured the 3-attempt policy.
        assert_eq!(crm.read_calls.load(Ordering::SeqCst), 3);
        // No occurrence id, no folder; upload goes straight to root.
        assert_eq!(docs.folder_calls.load(Ordering::SeqCst), 0);
        let names = docs.uploaded_names.lock().expect("mutex poisoned");
        assert_eq!(names[0].1, "root-folder");
    }

    #[tokio::test]
    async fn resolved_occurrence_id_uploads_into_named_folder() {
        let crm = Arc::new(StubCrm::succeeding("ABC123", vec![Ok(Some("OCC-0042".into()))]));
        let docs = Arc::new(StubDocs::new());
        let result = service(crm, Arc::clone(&docs))
            .submit(&request_with(vec![blob("report.pdf")]))
            .await;

        assert!(result.success);
        assert_eq!(docs.folder_calls.load(Ordering::SeqCst), 1);
        let names = docs.uploaded_names.lock().expect("mutex poisoned");
        assert_eq!(names[0].1, "folder-OCC-0042");
        // Target name keeps the stem and extension around the suffix.
        assert!(names[0].0.starts_with("report_"));
        assert!(names[0].0.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn folder_creation_failure_falls_back_to_root() {
        let crm = Arc::new(StubCrm::succeeding("ABC123", vec![Ok(Some("OCC-0042".into()))]));
        let docs = Arc::new(StubDocs { fail_folders: true, ..StubDocs::new() });
        let result = service(crm, Arc::clone(&docs))
            .submit(&request_with(vec![blob("report.pdf")]))
            .await;

        assert!(result.success);
        assert_eq!(result.uploads[0].status, UploadStatus::Uploaded);
        assert!(result.warnings.iter().any(|w| w.contains("OCC-0042")));
        let names = docs.uploaded_names.lock().expect("mutex poisoned");
        assert_eq!(names[0].1, "root-folder");
    }

    #[tokio::test]
    async fn link_failure_keeps_upload_successful() {
        let crm = Arc::new(StubCrm::succeeding("ABC123", vec![Ok(Some("OCC-0042".into()))]));
        let docs = Arc::new(StubDocs {
            fail_links_for: vec!["report".into()],
            ..StubDocs::new()
        });
        let result = service(crm, Arc::clone(&docs))
            .submit(&request_with(vec![blob("report.pdf")]))
            .await;

        assert!(result.success);
        assert_eq!(result.uploads[0].status, UploadStatus::Uploaded);
        assert!(result.uploads[0].share_link.is_none());
        assert!(result.warnings.iter().any(|w| w.contains("share link")));
    }

    #[tokio::test]
    async fn poll_read_error_is_downgraded_to_a_warning() {
        let crm = Arc::new(StubCrm::succeeding(
            "ABC123",
            vec![Err(IntakeError::CrmTransport("read timed out".into()))],
        ));
        let docs = Arc::new(StubDocs::new());
        let result = service(Arc::clone(&crm), docs).submit(&request_with(vec![])).await;

        assert!(result.success);
        assert!(result.occurrence_id.is_none());
        assert!(result.is_degraded());
        // The error stopped polling; remaining attempts were not spent.
        assert_eq!(crm.read_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disambiguated_name_keeps_extension() {
        assert_eq!(disambiguated_name("report.pdf", "1a2b3c4d"), "report_1a2b3c4d.pdf");
        assert_eq!(disambiguated_name("archive.tar.gz", "1a2b3c4d"), "archive.tar_1a2b3c4d.gz");
        assert_eq!(disambiguated_name("README", "1a2b3c4d"), "README_1a2b3c4d");
        assert_eq!(disambiguated_name(".gitignore", "1a2b3c4d"), ".gitignore_1a2b3c4d");
    }
}
