//! Bearer-token acquisition for the external services
//!
//! Each service authenticates with a short-lived access token obtained
//! through an OAuth refresh-token exchange. [`TokenCache`] holds one token
//! per service and is the only state shared between concurrent
//! submissions; service clients see it through the narrow
//! [`AccessTokenProvider`] trait.

mod cache;
mod types;

use std::sync::Arc;

use aerointake_common::time::{Clock, SystemClock};
use aerointake_domain::{ExternalService, Result};
use async_trait::async_trait;

pub use cache::TokenCache;
pub use types::{CachedToken, TokenErrorResponse, TokenResponse};

/// Source of a valid bearer token for one service.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// [`AccessTokenProvider`] view of a [`TokenCache`] pinned to one service.
pub struct ServiceTokenProvider<C: Clock = SystemClock> {
    cache: Arc<TokenCache<C>>,
    service: ExternalService,
}

impl<C: Clock> ServiceTokenProvider<C> {
    pub fn new(cache: Arc<TokenCache<C>>, service: ExternalService) -> Self {
        Self { cache, service }
    }
}

#[async_trait]
impl<C: Clock + 'static> AccessTokenProvider for ServiceTokenProvider<C> {
    async fn access_token(&self) -> Result<String> {
        self.cache.access_token(self.service).await
    }
}
