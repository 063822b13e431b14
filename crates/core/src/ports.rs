//! Port interfaces for the ledger transport
//!
//! The core never speaks HTTP or OAuth directly. A [`SessionFactory`] turns
//! credentials into a signed [`TransportSession`]; the session sends one
//! [`ServiceRequest`] and hands back the [`RawResponse`] untouched.

use std::sync::Arc;

use async_trait::async_trait;
use ledgerlink_domain::Result;
use serde_json::Value;

/// HTTP method used against the ledger service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Request body variants understood by the transport
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Sent as-is (JSON documents, query statements)
    Text(String),
    /// `application/x-www-form-urlencoded` pairs, included in the signature
    Form(Vec<(String, String)>),
}

/// One logical request against the ledger service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Sign through the `Authorization` header rather than query parameters
    pub header_auth: bool,
    /// Realm (company identifier) advertised in the signature
    pub realm: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ServiceRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>, realm: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            header_auth: true,
            realm: realm.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(url: impl Into<String>, realm: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url, realm)
    }

    pub fn post(url: impl Into<String>, realm: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url, realm)
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Value of a header, matched case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Text body, if any.
    pub fn text_body(&self) -> Option<&str> {
        match &self.body {
            RequestBody::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Raw response as received from the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, content_type: None, body: body.into() }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// How the response body is expected to be encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseFormat {
    Json,
    /// Legacy resource surface
    Xml,
    /// Bare download URL in the body
    FileLink,
}

/// Authenticated session able to send signed requests
#[async_trait]
pub trait TransportSession: Send + Sync {
    /// Send one request. Errors are transport failures only; fault bodies
    /// come back as ordinary responses.
    async fn send(&self, request: &ServiceRequest) -> Result<RawResponse>;
}

/// Establishes transport sessions from configured credentials
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Create a session. Missing credentials are a configuration error.
    async fn create_session(&self) -> Result<Arc<dyn TransportSession>>;
}

/// Decodes an XML document into the same mapping shape as JSON bodies
pub trait XmlDecoder: Send + Sync {
    fn decode(&self, document: &str) -> Result<Value>;
}
