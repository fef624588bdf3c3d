use std::sync::Arc;

use aerointake_core::ports::{DocumentStorePort, RemoteFileId};
use aerointake_domain::{DocumentStoreConfig, FileBlob, IntakeError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use crate::auth::AccessTokenProvider;
use crate::http::HttpClient;

/// REST client for the cloud document store.
pub struct DocumentStoreClient {
    http: HttpClient,
    tokens: Arc<dyn AccessTokenProvider>,
    api_domain: String,
}

impl DocumentStoreClient {
    pub fn new(
        http: HttpClient,
        tokens: Arc<dyn AccessTokenProvider>,
        config: &DocumentStoreConfig,
    ) -> Self {
        Self {
            http,
            tokens,
            api_domain: config.api_domain.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, tail: &str) -> String {
        format!("{}/api/v1/{tail}", self.api_domain)
    }
}

#[async_trait]
impl DocumentStorePort for DocumentStoreClient {
    async fn upload(
        &self,
        file: &FileBlob,
        target_name: &str,
        parent_id: &str,
    ) -> Result<RemoteFileId> {
        let token = self.tokens.access_token().await?;

        let part = Part::bytes(file.bytes.clone())
            .file_name(target_name.to_string())
            .mime_str(&file.content_type)
            .map_err(|err| {
                IntakeError::Upload(format!(
                    "invalid content type '{}': {err}",
                    file.content_type
                ))
            })?;
        let form = Form::new()
            .part("content", part)
            .text("parent_id", parent_id.to_string())
            .text("filename", target_name.to_string());

        let builder = self
            .http
            .request(Method::POST, self.endpoint("upload"))
            .bearer_auth(token)
            .multipart(form);

        // Multipart bodies cannot be replayed, so uploads are single
        // attempt.
        let response = self
            .http
            .send_once(builder)
            .await
            .map_err(|err| IntakeError::Upload(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IntakeError::Upload(format!(
                "upload of '{target_name}' failed with HTTP {status}"
            )));
        }

        let body: Value = response.json().await.map_err(|err| {
            IntakeError::Upload(format!("malformed upload response: {err}"))
        })?;
        let remote_id = body
            .pointer("/data/0/attributes/resource_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                IntakeError::Upload("upload response carries no resource id".into())
            })?;

        debug!(%target_name, %remote_id, "file uploaded");
        Ok(remote_id)
    }

    async fn publish_link(&self, remote_id: &str) -> Result<String> {
        let token = self.tokens.access_token().await?;

        let body = json!({
            "data": {
                "type": "links",
                "attributes": {
                    "resource_id": remote_id,
                    "link_type": "view",
                }
            }
        });
        let builder = self
            .http
            .request(Method::POST, self.endpoint("links"))
            .bearer_auth(token)
            .json(&body);

        let response = self
            .http
            .send(builder)
            .await
            .map_err(|err| IntakeError::LinkPublish(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IntakeError::LinkPublish(format!(
                "share link for '{remote_id}' failed with HTTP {status}"
            )));
        }

        let body: Value = response.json().await.map_err(|err| {
            IntakeError::LinkPublish(format!("malformed link response: {err}"))
        })?;
        let link = body
            .pointer("/data/attributes/link")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                IntakeError::LinkPublish("link response carries no link URL".into())
            })?;

        debug!(%remote_id, "share link published");
        Ok(link)
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String> {
        let token = self.tokens.access_token().await?;

        let body = json!({
            "data": {
                "type": "files",
                "attributes": {
                    "name": name,
                    "parent_id": parent_id,
                }
            }
        });
        let builder = self
            .http
            .request(Method::POST, self.endpoint("files"))
            .bearer_auth(token)
            .json(&body);

        // Single attempt: a retried create could leave duplicate folders.
        let response = self
            .http
            .send_once(builder)
            .await
            .map_err(|err| IntakeError::Upload(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IntakeError::Upload(format!(
                "folder '{name}' creation failed with HTTP {status}"
            )));
        }

        let body: Value = response.json().await.map_err(|err| {
            IntakeError::Upload(format!("malformed folder response: {err}"))
        })?;
        let folder_id = body
            .pointer("/data/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                IntakeError::Upload("folder response carries no folder id".into())
            })?;

        debug!(%name, %folder_id, "folder created");
        Ok(folder_id)
    }
}
