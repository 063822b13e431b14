//! OAuth 1.0a support: request signing, the signed transport session and the
//! three-legged handshake

pub mod handshake;
pub mod session;
pub mod signature;

pub use handshake::{AccessToken, OAuth1Client, OAuthEndpoints, RequestToken};
pub use session::{OAuth1Session, OAuth1SessionFactory};
pub use signature::OAuthSigner;
