use std::time::Instant;

use serde::Deserialize;

/// Successful body of the refresh-token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Server-reported lifetime in seconds.
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Error body of a rejected refresh-token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// One cached access token. Consumers receive the value, never this
/// record.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub value: String,
    pub valid_until: Instant,
}

impl CachedToken {
    #[must_use]
    pub fn is_valid(&self, now: Instant) -> bool {
        now < self.valid_until
    }
}
