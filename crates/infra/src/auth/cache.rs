use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use aerointake_common::time::{Clock, SystemClock};
use aerointake_domain::{
    ExternalService, IntakeError, Result, ServiceCredentials, TOKEN_EXPIRY_MARGIN_SECS,
};
use reqwest::Method;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::types::{CachedToken, TokenErrorResponse, TokenResponse};
use super::{AccessTokenProvider, ServiceTokenProvider};
use crate::http::HttpClient;

struct ServiceSlot {
    credentials: ServiceCredentials,
    // Held across the refresh exchange so concurrent expiry triggers
    // exactly one network call per service.
    token: Mutex<Option<CachedToken>>,
}

/// Process-wide token cache, one slot per external service.
///
/// Generic over [`Clock`] so expiry can be tested without real time
/// passing.
pub struct TokenCache<C: Clock = SystemClock> {
    http: HttpClient,
    clock: C,
    slots: HashMap<ExternalService, ServiceSlot>,
}

impl TokenCache<SystemClock> {
    pub fn new(http: HttpClient, credentials: HashMap<ExternalService, ServiceCredentials>) -> Self {
        Self::with_clock(http, credentials, SystemClock)
    }
}

impl<C: Clock> TokenCache<C> {
    pub fn with_clock(
        http: HttpClient,
        credentials: HashMap<ExternalService, ServiceCredentials>,
        clock: C,
    ) -> Self {
        let slots = credentials
            .into_iter()
            .map(|(service, credentials)| {
                (service, ServiceSlot { credentials, token: Mutex::new(None) })
            })
            .collect();
        Self { http, clock, slots }
    }

    /// Narrow [`AccessTokenProvider`] view of this cache pinned to one
    /// service, for handing to a service client.
    pub fn provider_for(
        self: &Arc<Self>,
        service: ExternalService,
    ) -> Arc<dyn AccessTokenProvider>
    where
        C: 'static,
    {
        Arc::new(ServiceTokenProvider::new(Arc::clone(self), service))
    }

    /// Return a bearer token valid for `service`, refreshing if the cached
    /// one is absent or expired.
    pub async fn access_token(&self, service: ExternalService) -> Result<String> {
        let slot = self.slots.get(&service).ok_or_else(|| {
            IntakeError::AuthConfig(format!("no credentials configured for service '{service}'"))
        })?;

        let mut guard = slot.token.lock().await;

        if let Some(token) = guard.as_ref() {
            if token.is_valid(self.clock.now()) {
                debug!(%service, "using cached access token");
                return Ok(token.value.clone());
            }
        }

        let fresh = self.exchange(service, &slot.credentials).await?;
        let value = fresh.value.clone();
        *guard = Some(fresh);
        Ok(value)
    }

    /// Perform the refresh-token exchange and compute the local validity
    /// window.
    async fn exchange(
        &self,
        service: ExternalService,
        credentials: &ServiceCredentials,
    ) -> Result<CachedToken> {
        validate_credentials(service, credentials)?;

        info!(%service, "refreshing access token");

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", credentials.refresh_token.as_str()),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ];
        let builder = self.http.request(Method::POST, &credentials.token_url).form(&form);

        let response = self
            .http
            .send(builder)
            .await
            .map_err(|err| IntakeError::AuthExchange(format!("token endpoint unreachable: {err}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            IntakeError::AuthExchange(format!("failed to read token response: {err}"))
        })?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(rejection) => match rejection.error_description {
                    Some(description) => format!("{}: {description}", rejection.error),
                    None => rejection.error,
                },
                Err(_) => format!("HTTP {status}"),
            };
            warn!(%service, %status, "token exchange rejected");
            return Err(IntakeError::AuthExchange(format!(
                "refresh rejected for service '{service}': {detail}"
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|err| {
            IntakeError::AuthExchange(format!("malformed token response: {err}"))
        })?;

        // The margin keeps the token from being used down to the very
        // last second of its server-side lifetime.
        let usable_secs = parsed.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS as u64);
        let valid_until = self.clock.now() + Duration::from_secs(usable_secs);

        debug!(%service, expires_in = parsed.expires_in, usable_secs, "access token refreshed");

        Ok(CachedToken { value: parsed.access_token, valid_until })
    }
}

fn validate_credentials(
    service: ExternalService,
    credentials: &ServiceCredentials,
) -> Result<()> {
    let missing = [
        ("token_url", &credentials.token_url),
        ("client_id", &credentials.client_id),
        ("client_secret", &credentials.client_secret),
        ("refresh_token", &credentials.refresh_token),
    ]
    .iter()
    .find(|(_, value)| value.is_empty())
    .map(|(name, _)| *name);

    match missing {
        Some(name) => Err(IntakeError::AuthConfig(format!(
            "credential field '{name}' is empty for service '{service}'"
        ))),
        None => Ok(()),
    }
}
