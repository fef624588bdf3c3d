use std::sync::Arc;

use aerointake_core::ports::CrmPort;
use aerointake_domain::{CrmConfig, CrmRecordHandle, FieldMap, IntakeError, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::auth::AccessTokenProvider;
use crate::http::HttpClient;

/// Envelope wrapping every CRM response; one entry per record in the
/// request.
#[derive(Debug, Deserialize)]
struct CrmEnvelope {
    #[serde(default)]
    data: Vec<CrmEntry>,
}

#[derive(Debug, Deserialize)]
struct CrmEntry {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Value,
}

/// REST client for the CRM record store.
pub struct CrmClient {
    http: HttpClient,
    tokens: Arc<dyn AccessTokenProvider>,
    api_domain: String,
    api_version: String,
    occurrence_id_field: String,
}

impl CrmClient {
    pub fn new(http: HttpClient, tokens: Arc<dyn AccessTokenProvider>, config: &CrmConfig) -> Self {
        Self {
            http,
            tokens,
            api_domain: config.api_domain.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            occurrence_id_field: config.occurrence_id_field.clone(),
        }
    }

    fn record_url(&self, module: &str, record_id: Option<&str>) -> String {
        match record_id {
            Some(id) => format!("{}/{}/{}/{}", self.api_domain, self.api_version, module, id),
            None => format!("{}/{}/{}", self.api_domain, self.api_version, module),
        }
    }
}

#[async_trait]
impl CrmPort for CrmClient {
    async fn create_record(&self, module: &str, fields: &FieldMap) -> Result<CrmRecordHandle> {
        let token = self.tokens.access_token().await?;
        let body = json!({ "data": [fields] });

        let builder = self
            .http
            .request(Method::POST, self.record_url(module, None))
            .bearer_auth(token)
            .json(&body);

        // Single attempt: record creation is not idempotent and a retried
        // POST could create duplicates.
        let response = self
            .http
            .send_once(builder)
            .await
            .map_err(|err| IntakeError::CrmTransport(err.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|err| {
            IntakeError::CrmTransport(format!("failed to read CRM response: {err}"))
        })?;

        let envelope: CrmEnvelope = serde_json::from_str(&text).map_err(|_| {
            IntakeError::CrmTransport(format!("CRM returned HTTP {status} with unexpected body"))
        })?;
        let entry = envelope.data.into_iter().next().ok_or_else(|| {
            IntakeError::CrmTransport(format!("CRM returned HTTP {status} with an empty envelope"))
        })?;

        if status.is_success() && entry.code.as_deref() == Some("SUCCESS") {
            let record_id = entry
                .details
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    IntakeError::CrmTransport("CRM success response carries no record id".into())
                })?;

            debug!(module, %record_id, "CRM record created");
            return Ok(CrmRecordHandle { module: module.to_string(), record_id });
        }

        // Rejection: carry the remote code, message and details verbatim.
        let code = entry.code.unwrap_or_else(|| format!("HTTP_{}", status.as_u16()));
        let message = entry.message.unwrap_or_default();
        warn!(module, %code, "CRM rejected record");
        Err(IntakeError::CrmSubmission { code, message, details: entry.details })
    }

    async fn read_occurrence_id(&self, module: &str, record_id: &str) -> Result<Option<String>> {
        let token = self.tokens.access_token().await?;

        let builder = self
            .http
            .request(Method::GET, self.record_url(module, Some(record_id)))
            .query(&[("fields", self.occurrence_id_field.as_str())])
            .bearer_auth(token);

        let response = self
            .http
            .send(builder)
            .await
            .map_err(|err| IntakeError::CrmTransport(err.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(IntakeError::CrmTransport(format!(
                "CRM record read failed with HTTP {status}"
            )));
        }

        let envelope: ReadEnvelope = response.json().await.map_err(|err| {
            IntakeError::CrmTransport(format!("malformed CRM record body: {err}"))
        })?;

        let value = envelope
            .data
            .first()
            .and_then(|record| record.get(&self.occurrence_id_field))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(value)
    }
}

#[derive(Debug, Deserialize)]
struct ReadEnvelope {
    #[serde(default)]
    data: Vec<serde_json::Map<String, Value>>,
}
