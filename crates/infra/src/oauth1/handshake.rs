//! Three-legged OAuth 1.0a handshake
//!
//! 1. [`OAuth1Client::request_token`] obtains a temporary token, announcing
//!    the callback URL.
//! 2. The user opens [`OAuth1Client::authorize_url`] and approves access; the
//!    service redirects to the callback with an `oauth_verifier`.
//! 3. [`OAuth1Client::access_token`] exchanges the temporary token and the
//!    verifier for the long-lived access token pair.

use ledgerlink_domain::constants::{ACCESS_TOKEN_URL, AUTHORIZE_URL, REQUEST_TOKEN_URL};
use ledgerlink_domain::{Credentials, LedgerError, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use tracing::{debug, info};
use url::Url;

use super::signature::{authorization_header, percent_encode, OAuthSigner};
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Temporary credentials from the first leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub token: String,
    pub secret: String,
}

/// Long-lived access token pair from the last leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub secret: String,
}

/// Token endpoints of the authorization server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub request_token_url: String,
    pub access_token_url: String,
    pub authorize_url: String,
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self {
            request_token_url: REQUEST_TOKEN_URL.to_string(),
            access_token_url: ACCESS_TOKEN_URL.to_string(),
            authorize_url: AUTHORIZE_URL.to_string(),
        }
    }
}

/// Runs the handshake for one consumer
pub struct OAuth1Client {
    http: HttpClient,
    consumer_key: String,
    consumer_secret: String,
    callback_url: String,
    endpoints: OAuthEndpoints,
}

impl OAuth1Client {
    pub fn new(
        http: HttpClient,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            callback_url: callback_url.into(),
            endpoints: OAuthEndpoints::default(),
        }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: OAuthEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    fn signer(&self) -> OAuthSigner {
        OAuthSigner::consumer_only(&self.consumer_key, &self.consumer_secret)
    }

    /// First leg: obtain a request token bound to the callback URL.
    pub async fn request_token(&self) -> Result<RequestToken> {
        let url = parse_url(&self.endpoints.request_token_url)?;
        let signable: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let oauth = self.signer().signed_params(
            "GET",
            &url,
            &signable,
            &[("oauth_callback".to_string(), self.callback_url.clone())],
        )?;

        let builder = self
            .http
            .request(Method::GET, url)
            .header(AUTHORIZATION, authorization_header(None, &oauth));
        let fields = self.token_response(builder, "request token").await?;
        let token = RequestToken {
            token: required(&fields, "oauth_token")?,
            secret: required(&fields, "oauth_token_secret")?,
        };
        debug!("request token obtained");
        Ok(token)
    }

    /// Second leg: where the user approves access.
    pub fn authorize_url(&self, request_token: &RequestToken) -> String {
        let separator = if self.endpoints.authorize_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{separator}oauth_token={}",
            self.endpoints.authorize_url,
            percent_encode(&request_token.token)
        )
    }

    /// Last leg: exchange the request token and verifier for an access token.
    pub async fn access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken> {
        let url = parse_url(&self.endpoints.access_token_url)?;
        let form = vec![("oauth_verifier".to_string(), verifier.to_string())];
        let mut signable: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        signable.extend(form.iter().cloned());

        let oauth = self
            .signer()
            .with_token(&request_token.token, &request_token.secret)
            .signed_params("POST", &url, &signable, &[])?;

        let body = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(&form).finish();
        let builder = self
            .http
            .request(Method::POST, url)
            .header(AUTHORIZATION, authorization_header(None, &oauth))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);
        let fields = self.token_response(builder, "access token").await?;
        let token = AccessToken {
            token: required(&fields, "oauth_token")?,
            secret: required(&fields, "oauth_token_secret")?,
        };
        info!("access token obtained");
        Ok(token)
    }

    /// Complete credentials for a realm from an access token.
    pub fn credentials(&self, access: AccessToken, realm_id: impl Into<String>) -> Credentials {
        Credentials {
            consumer_key: self.consumer_key.clone(),
            consumer_secret: self.consumer_secret.clone(),
            access_token: access.token,
            access_token_secret: access.secret,
            realm_id: realm_id.into(),
        }
    }

    async fn token_response(
        &self,
        builder: reqwest::RequestBuilder,
        leg: &str,
    ) -> Result<Vec<(String, String)>> {
        let reply = self.http.send(builder).await?;
        if !reply.is_success() {
            return Err(LedgerError::Auth(format!(
                "{leg} request rejected with HTTP {}: {}",
                reply.status,
                reply.body.trim()
            )));
        }
        Ok(url::form_urlencoded::parse(reply.body.trim().as_bytes()).into_owned().collect())
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| InfraError::from(e).into())
}

fn required(fields: &[(String, String)], name: &str) -> Result<String> {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
        .ok_or_else(|| LedgerError::Auth(format!("token response is missing {name}")))
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> OAuth1Client {
        OAuth1Client::new(HttpClient::new().unwrap(), "ck", "cs", "http://localhost:8080/callback")
            .with_endpoints(OAuthEndpoints {
                request_token_url: format!("{}/oauth/v1/get_request_token", server.uri()),
                access_token_url: format!("{}/oauth/v1/get_access_token", server.uri()),
                authorize_url: "https://apps.example.test/Connect/Begin".into(),
            })
    }

    #[tokio::test]
    async fn full_handshake() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/v1/get_request_token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "oauth_token=req-token&oauth_token_secret=req-secret&oauth_callback_confirmed=true",
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth/v1/get_access_token"))
            .and(body_string("oauth_verifier=verif"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("oauth_token=acc-token&oauth_token_secret=acc%2Fsecret"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let request_token = client.request_token().await.unwrap();
        assert_eq!(request_token.token, "req-token");
        assert_eq!(
            client.authorize_url(&request_token),
            "https://apps.example.test/Connect/Begin?oauth_token=req-token"
        );

        let access = client.access_token(&request_token, "verif").await.unwrap();
        assert_eq!(access.secret, "acc/secret");
        let credentials = client.credentials(access, "42");
        assert!(credentials.validate().is_ok());

        let received = server.received_requests().await.unwrap();
        let first = received[0].headers.get("authorization").unwrap().to_str().unwrap();
        assert!(first.contains("oauth_callback=\"http%3A%2F%2Flocalhost%3A8080%2Fcallback\""), "{first}");
        let second = received[1].headers.get("authorization").unwrap().to_str().unwrap();
        assert!(second.contains("oauth_token=\"req-token\""), "{second}");
    }

    #[tokio::test]
    async fn rejected_request_token_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("oauth_problem=signature_invalid"))
            .mount(&server)
            .await;

        let err = client(&server).request_token().await.unwrap_err();
        match err {
            LedgerError::Auth(message) => assert!(message.contains("signature_invalid")),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn token_response_without_secret_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("oauth_token=only"))
            .mount(&server)
            .await;

        assert!(matches!(client(&server).request_token().await, Err(LedgerError::Auth(_))));
    }
}
