//! Pipeline configuration structs
//!
//! Loaded by `aerointake-infra`'s loader from environment variables or a
//! config file; consumed by the token cache, the service clients and the
//! orchestrator.

use serde::{Deserialize, Serialize};

/// Seconds subtracted from the server-reported token lifetime so a token
/// is never used down to the very last second.
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 300;

/// Default number of occurrence-id poll attempts.
pub const DEFAULT_RESOLVER_MAX_ATTEMPTS: u32 = 5;

/// Default delay between occurrence-id poll attempts.
pub const DEFAULT_RESOLVER_INTERVAL_MS: u64 = 2000;

/// OAuth refresh-token credentials for one external service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCredentials {
    /// Token endpoint URL for the refresh exchange.
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// CRM connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    /// API origin, e.g. `https://crm.example.com`.
    pub api_domain: String,
    /// API version path segment, e.g. `v2`.
    pub api_version: String,
    /// Module (named record collection) that holds safety reports.
    pub module: String,
    /// Field the CRM populates asynchronously with the occurrence
    /// identifier after record creation.
    pub occurrence_id_field: String,
    pub credentials: ServiceCredentials,
}

/// Document store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStoreConfig {
    /// API origin of the document store.
    pub api_domain: String,
    /// Folder all submissions land under when no occurrence-id folder
    /// exists.
    pub root_folder_id: String,
    pub credentials: ServiceCredentials,
}

/// Occurrence-id polling policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_RESOLVER_MAX_ATTEMPTS
}

fn default_interval_ms() -> u64 {
    DEFAULT_RESOLVER_INTERVAL_MS
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_RESOLVER_MAX_ATTEMPTS, interval_ms: DEFAULT_RESOLVER_INTERVAL_MS }
    }
}

/// Top-level configuration for the submission pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    pub crm: CrmConfig,
    pub document_store: DocumentStoreConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}
