//! OAuth1 credential material

use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};

/// Consumer and access-token material plus the realm (company) identifier.
///
/// Immutable once a session has been established.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
    #[serde(alias = "company_id")]
    pub realm_id: String,
}

impl Credentials {
    /// Names of the required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("consumer_key", &self.consumer_key),
            ("consumer_secret", &self.consumer_secret),
            ("access_token", &self.access_token),
            ("access_token_secret", &self.access_token_secret),
            ("realm_id", &self.realm_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Check that every value needed for a signed session is present.
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::Config(format!(
                "missing credentials for a ledger session: {}",
                missing.join(", ")
            )))
        }
    }

    /// Consumer key and secret are all the handshake needs.
    pub fn has_consumer(&self) -> bool {
        !self.consumer_key.trim().is_empty() && !self.consumer_secret.trim().is_empty()
    }
}

// Secrets never reach logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &redact(&self.access_token))
            .field("access_token_secret", &"<redacted>")
            .field("realm_id", &self.realm_id)
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> Credentials {
        Credentials {
            consumer_key: "ck".into(),
            consumer_secret: "cs".into(),
            access_token: "at".into(),
            access_token_secret: "ats".into(),
            realm_id: "123".into(),
        }
    }

    #[test]
    fn validate_lists_every_missing_field() {
        assert!(full().validate().is_ok());

        let creds = Credentials { access_token: String::new(), realm_id: " ".into(), ..full() };
        match creds.validate() {
            Err(LedgerError::Config(message)) => {
                assert!(message.contains("access_token"));
                assert!(message.contains("realm_id"));
                assert!(!message.contains("consumer_key"));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?}", full());
        assert!(rendered.contains("ck"));
        assert!(!rendered.contains("ats"));
        assert!(!rendered.contains("\"cs\""));
    }

    #[test]
    fn company_id_is_accepted_as_realm_alias() {
        let creds: Credentials =
            serde_json::from_str(r#"{"consumer_key":"k","company_id":"99"}"#).expect("parses");
        assert_eq!(creds.realm_id, "99");
        assert!(!creds.has_consumer());
    }
}
