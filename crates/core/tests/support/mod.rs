//! Shared test helpers for `ledgerlink-core` integration tests.
//!
//! A scripted transport stands in for the signed HTTP session. It records
//! every request so attempt counts, paging offsets and cache hits can be
//! asserted directly.

#![allow(dead_code)]

pub mod transport;

pub use transport::*;
