//! HTTP transport shared by the service clients

mod client;

pub use client::{HttpClient, HttpClientBuilder, HttpError};
