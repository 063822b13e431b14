//! HTTP client shared by the signed transport and the OAuth handshake

pub mod client;

pub use client::{HttpClient, HttpClientBuilder, HttpReply};
