//! CRM record store client

mod client;

pub use client::CrmClient;
