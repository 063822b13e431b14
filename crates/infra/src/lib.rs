//! # LedgerLink Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest HTTP client wrapper
//! - OAuth 1.0a signing, the signed transport session and the handshake
//! - The quick-xml decoder for legacy responses
//! - Configuration loading (environment, JSON, TOML)
//!
//! ## Architecture
//! - Implements traits defined in `ledgerlink-core`
//! - Contains all "impure" code (network and file I/O)

pub mod config;
pub mod connect;
pub mod errors;
pub mod http;
pub mod oauth1;
pub mod xml;

// Re-export commonly used items
pub use connect::{connect, connect_with};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, HttpReply};
pub use oauth1::{AccessToken, OAuth1Client, OAuth1Session, OAuth1SessionFactory, OAuthEndpoints, RequestToken};
pub use xml::QuickXmlDecoder;
