use std::time::Duration;

use ledgerlink_domain::LedgerError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder};
use tracing::debug;

use crate::errors::InfraError;

const DEFAULT_USER_AGENT: &str = concat!("ledgerlink/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fully read HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpReply {
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Single-attempt HTTP client.
///
/// Transport failures surface immediately as [`LedgerError::Network`]; the
/// request executor owns retrying.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn new() -> Result<Self, LedgerError> {
        Self::builder().build()
    }

    /// Start a request on the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send the request once and read the whole body.
    pub async fn send(&self, builder: RequestBuilder) -> Result<HttpReply, LedgerError> {
        let request = builder.build().map_err(InfraError::from)?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        let response = self.client.execute(request).await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            InfraError::from(err)
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(InfraError::from)?;
        debug!(%method, %url, status, bytes = body.len(), "received HTTP response");

        Ok(HttpReply { status, content_type, body })
    }
}

#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: DEFAULT_TIMEOUT, user_agent: None }
    }
}

impl HttpClientBuilder {
    /// Whole-request timeout, connect included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, LedgerError> {
        let agent = self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(agent)
            .no_proxy()
            .build()
            .map_err(InfraError::from)?;
        Ok(HttpClient { client })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn unavailable_is_returned_after_one_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().expect("http client");
        let reply = client.send(client.request(Method::GET, server.uri())).await.expect("reply");

        assert_eq!(reply.status, 503);
        assert!(!reply.is_success());
        assert_eq!(reply.body, "busy");
    }

    #[tokio::test]
    async fn reply_carries_content_type_and_agent_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "ledgerlink-test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<ok/>", "application/xml"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::builder().user_agent("ledgerlink-test").build().expect("client");
        let reply = client.send(client.request(Method::GET, server.uri())).await.expect("reply");

        assert!(reply.is_success());
        assert_eq!(reply.content_type.as_deref(), Some("application/xml"));
        assert_eq!(reply.body, "<ok/>");
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_error() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr")
        };

        let client = HttpClient::builder().timeout(Duration::from_secs(2)).build().expect("client");
        let result = client.send(client.request(Method::GET, format!("http://{addr}"))).await;

        assert!(matches!(result, Err(LedgerError::Network(_))), "{result:?}");
    }
}
