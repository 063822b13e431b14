//! # LedgerLink Domain
//!
//! Business domain types and models for LedgerLink.
//!
//! This crate contains:
//! - Entity records, collections and the entity catalog
//! - Credentials, query descriptors and the fault envelope
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Remote-service constants
//!
//! ## Architecture
//! - No dependencies on other LedgerLink crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
