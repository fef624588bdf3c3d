//! # Aerointake Infrastructure
//!
//! Infrastructure implementations of the core submission-pipeline ports.
//!
//! This crate contains:
//! - The shared HTTP client (timeouts, retry with backoff)
//! - OAuth token acquisition and caching
//! - CRM and document store REST clients
//! - Configuration loading and telemetry setup
//!
//! ## Architecture
//! - Implements traits defined in `aerointake-core`
//! - Contains all "impure" code (network I/O, environment, filesystem)

pub mod auth;
pub mod config;
pub mod crm;
pub mod docstore;
pub mod http;
pub mod observability;
pub mod pipeline;

// Re-export commonly used items
pub use auth::{AccessTokenProvider, ServiceTokenProvider, TokenCache};
pub use crm::CrmClient;
pub use docstore::DocumentStoreClient;
pub use http::{HttpClient, HttpClientBuilder, HttpError};
pub use pipeline::build_pipeline;
