//! Terminal client for a peer-to-peer file transfer backend.
//!
//! The backend does the transferring; this crate shows incoming offers,
//! relays accept/reject decisions, tracks progress notifications and issues
//! connect, list and send requests.

pub mod api;
pub mod config;
pub mod console;
pub mod coordinator;
pub mod metrics;
