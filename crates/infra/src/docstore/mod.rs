//! Cloud document store client

mod client;

pub use client::DocumentStoreClient;
