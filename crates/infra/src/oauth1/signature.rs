//! OAuth 1.0 HMAC-SHA1 request signing
//!
//! Builds the signature base string from the request method, the normalized
//! URL and every signable parameter (URL query, form body and `oauth_*`
//! protocol values), signs it with the consumer and token secrets, and renders
//! the `Authorization` header.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use ledgerlink_domain::{LedgerError, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const OAUTH_VERSION: &str = "1.0";

const NONCE_LEN: usize = 32;

/// Percent-encode per RFC 3986, leaving only unreserved characters intact.
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Scheme, authority and path of `url`; default ports and the query are dropped.
pub fn normalized_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{}://{host}:{port}{}", url.scheme(), url.path()),
        None => format!("{}://{host}{}", url.scheme(), url.path()),
    }
}

/// Signature base string for a request.
pub fn base_string(method: &str, url: &Url, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> =
        params.iter().map(|(k, v)| (percent_encode(k), percent_encode(v))).collect();
    encoded.sort();
    let normalized_params =
        encoded.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(&normalized_url(url)),
        percent_encode(&normalized_params)
    )
}

/// Base64 HMAC-SHA1 of `base_string` keyed with both secrets.
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> Result<String> {
    let key = format!("{}&{}", percent_encode(consumer_secret), percent_encode(token_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| LedgerError::Internal(format!("invalid signing key: {e}")))?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Consumer plus (optional) token material used to sign requests
#[derive(Clone)]
pub struct OAuthSigner {
    consumer_key: String,
    consumer_secret: String,
    token: Option<String>,
    token_secret: String,
}

impl OAuthSigner {
    /// Signer for the request-token leg: no token yet.
    pub fn consumer_only(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: None,
            token_secret: String::new(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, token_secret: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self.token_secret = token_secret.into();
        self
    }

    /// Signed `oauth_*` protocol parameters, including `oauth_signature`.
    ///
    /// `request_params` are the URL query and form body pairs; `extra` holds
    /// additional protocol values such as `oauth_callback` or `oauth_verifier`.
    pub fn signed_params(
        &self,
        method: &str,
        url: &Url,
        request_params: &[(String, String)],
        extra: &[(String, String)],
    ) -> Result<Vec<(String, String)>> {
        self.signed_params_with(method, url, request_params, extra, &nonce(), timestamp())
    }

    pub(crate) fn signed_params_with(
        &self,
        method: &str,
        url: &Url,
        request_params: &[(String, String)],
        extra: &[(String, String)],
        nonce: &str,
        timestamp: u64,
    ) -> Result<Vec<(String, String)>> {
        let mut protocol = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ];
        if let Some(token) = &self.token {
            protocol.push(("oauth_token".to_string(), token.clone()));
        }
        protocol.extend(extra.iter().cloned());

        let mut all = protocol.clone();
        all.extend(request_params.iter().cloned());
        let signature =
            sign(&base_string(method, url, &all), &self.consumer_secret, &self.token_secret)?;

        protocol.push(("oauth_signature".to_string(), signature));
        Ok(protocol)
    }
}

/// `Authorization` header value for signed protocol parameters.
pub fn authorization_header(realm: Option<&str>, signed: &[(String, String)]) -> String {
    let mut parts = Vec::with_capacity(signed.len() + 1);
    if let Some(realm) = realm {
        parts.push(format!("realm=\"{}\"", percent_encode(realm)));
    }
    parts.extend(signed.iter().map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v))));
    format!("OAuth {}", parts.join(", "))
}

fn nonce() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(NONCE_LEN).map(char::from).collect()
}

fn timestamp() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
}
