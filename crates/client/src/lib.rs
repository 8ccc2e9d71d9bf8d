//! `stockroom-client`
//!
//! Thin HTTP client for the stockroom API. Authenticated calls take an explicit
//! [`Session`]; nothing is stashed in process-wide state.

pub mod client;
pub mod session;

pub use client::{ApiClient, ClientError};
pub use session::Session;
