//! # Aerointake Common
//!
//! Foundation utilities shared across the workspace. Deliberately free of
//! domain knowledge: anything that knows about submissions, CRM records or
//! document stores belongs in `aerointake-domain` or above.

pub mod time;

pub use time::{Clock, MockClock, SystemClock};
