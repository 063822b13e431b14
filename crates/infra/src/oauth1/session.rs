//! Signed transport session
//!
//! [`OAuth1Session`] is the production [`TransportSession`]: it turns a
//! [`ServiceRequest`] into a reqwest request, signs it with the access token
//! and returns the raw status, content type and body. Faults are left for the
//! response normalizer to interpret.

use std::sync::Arc;

use async_trait::async_trait;
use ledgerlink_core::{
    HttpMethod, RawResponse, RequestBody, ServiceRequest, SessionFactory, TransportSession,
};
use ledgerlink_domain::{Credentials, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use tracing::{debug, info};
use url::Url;

use super::signature::{authorization_header, OAuthSigner};
use crate::errors::InfraError;
use crate::http::HttpClient;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Session signing every request with one access token
#[derive(Clone)]
pub struct OAuth1Session {
    http: HttpClient,
    signer: OAuthSigner,
}

impl OAuth1Session {
    pub fn new(http: HttpClient, credentials: &Credentials) -> Self {
        let signer =
            OAuthSigner::consumer_only(&credentials.consumer_key, &credentials.consumer_secret)
                .with_token(&credentials.access_token, &credentials.access_token_secret);
        Self { http, signer }
    }
}

#[async_trait]
impl TransportSession for OAuth1Session {
    async fn send(&self, request: &ServiceRequest) -> Result<RawResponse> {
        let mut url = Url::parse(&request.url).map_err(InfraError::from)?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }

        let mut signable: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        if let RequestBody::Form(pairs) = &request.body {
            signable.extend(pairs.iter().cloned());
        }

        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };
        let oauth = self.signer.signed_params(method.as_str(), &url, &signable, &[])?;

        let mut builder = if request.header_auth {
            self.http
                .request(method, url)
                .header(AUTHORIZATION, authorization_header(Some(&request.realm), &oauth))
        } else {
            url.query_pairs_mut().extend_pairs(oauth.iter());
            self.http.request(method, url)
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Text(text) => builder.body(text.clone()),
            RequestBody::Form(pairs) => builder
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(url::form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish()),
        };

        let reply = self.http.send(builder).await?;
        debug!(status = reply.status, content_type = ?reply.content_type, "response received");

        Ok(RawResponse { status: reply.status, content_type: reply.content_type, body: reply.body })
    }
}

/// Creates [`OAuth1Session`]s once the credentials are complete
pub struct OAuth1SessionFactory {
    http: HttpClient,
    credentials: Credentials,
}

impl OAuth1SessionFactory {
    pub fn new(http: HttpClient, credentials: Credentials) -> Self {
        Self { http, credentials }
    }
}

#[async_trait]
impl SessionFactory for OAuth1SessionFactory {
    async fn create_session(&self) -> Result<Arc<dyn TransportSession>> {
        self.credentials.validate()?;
        info!(realm = %self.credentials.realm_id, "signed session established");
        Ok(Arc::new(OAuth1Session::new(self.http.clone(), &self.credentials)))
    }
}
