//! Pipeline assembly
//!
//! Wires configuration into the concrete clients and hands back a ready
//! [`SubmissionService`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use aerointake_core::{PollPolicy, SubmissionService};
use aerointake_domain::{ExternalService, IntakeConfig, IntakeError, Result};

use crate::auth::TokenCache;
use crate::crm::CrmClient;
use crate::docstore::DocumentStoreClient;
use crate::http::HttpClient;

/// Build the full submission pipeline from loaded configuration.
///
/// The token cache is shared by both service clients; everything else is
/// owned by the returned service.
pub fn build_pipeline(config: &IntakeConfig) -> Result<SubmissionService> {
    let http = HttpClient::builder()
        .timeout(Duration::from_secs(60))
        .max_attempts(3)
        .build()
        .map_err(|err| IntakeError::Internal(format!("failed to build HTTP client: {err}")))?;

    let mut credentials = HashMap::new();
    credentials.insert(ExternalService::Crm, config.crm.credentials.clone());
    credentials.insert(ExternalService::DocumentStore, config.document_store.credentials.clone());
    let tokens = Arc::new(TokenCache::new(http.clone(), credentials));

    let crm = Arc::new(CrmClient::new(
        http.clone(),
        tokens.provider_for(ExternalService::Crm),
        &config.crm,
    ));
    let documents = Arc::new(DocumentStoreClient::new(
        http,
        tokens.provider_for(ExternalService::DocumentStore),
        &config.document_store,
    ));

    let poll_policy = PollPolicy::new(
        config.resolver.max_attempts,
        Duration::from_millis(config.resolver.interval_ms),
    );

    Ok(SubmissionService::new(
        crm,
        documents,
        config.crm.module.clone(),
        config.document_store.root_folder_id.clone(),
        poll_policy,
    ))
}
