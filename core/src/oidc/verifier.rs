//! ID token verifier seam and its configuration

use async_trait::async_trait;
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use super::claims::VerifiedIdToken;
use crate::config::DEFAULT_LEEWAY_SECS;
use crate::error::VerifyError;
use crate::platform::HttpClient;

/// Verifies a raw ID token for one issuer and audience.
///
/// `http` is the transport the extractor was built with, so key material is
/// fetched through the same client as the code exchange.
#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    async fn verify(&self, raw: &str, http: &dyn HttpClient) -> Result<VerifiedIdToken, VerifyError>;
}

/// Checks applied by [`JwksVerifier`](super::JwksVerifier)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Expected `iss` claim
    pub issuer: String,
    /// Expected member of the `aud` claim
    pub client_id: String,
    /// Accepted JWS algorithms
    pub supported_signing_algs: Vec<Algorithm>,
    pub skip_client_id_check: bool,
    pub skip_expiry_check: bool,
    pub skip_issuer_check: bool,
    /// Allowed clock skew in seconds
    pub leeway_secs: u64,
}

impl VerifierConfig {
    pub fn new(issuer: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            client_id: client_id.into(),
            ..Self::default()
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            client_id: String::new(),
            supported_signing_algs: vec![Algorithm::RS256],
            skip_client_id_check: false,
            skip_expiry_check: false,
            skip_issuer_check: false,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }
}
