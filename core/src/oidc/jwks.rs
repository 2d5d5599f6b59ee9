//! JWKS (JSON Web Key Set) handling
//!
//! Resolves the key set used to check ID token signatures.

use jsonwebtoken::jwk::JwkSet;
use std::borrow::Cow;

use crate::config::USER_AGENT;
use crate::error::VerifyError;
use crate::platform::HttpClient;

/// Where the verifier gets its signing keys
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Keys provided up front
    Static(JwkSet),
    /// Keys fetched from the issuer's `jwks_uri` on every verification
    Remote { jwks_uri: String },
}

impl KeySource {
    pub(crate) async fn resolve(&self, http: &dyn HttpClient) -> Result<Cow<'_, JwkSet>, VerifyError> {
        match self {
            Self::Static(jwks) => Ok(Cow::Borrowed(jwks)),
            Self::Remote { jwks_uri } => fetch_jwks(jwks_uri, http).await.map(Cow::Owned),
        }
    }
}

/// Fetch JWKS from a URI
pub async fn fetch_jwks(jwks_uri: &str, http: &dyn HttpClient) -> Result<JwkSet, VerifyError> {
    let response = http
        .get(
            jwks_uri,
            &[("Accept", "application/json"), ("User-Agent", USER_AGENT)],
        )
        .await
        .map_err(|e| VerifyError::key_fetch(e.to_string()))?;

    // Only a 200 carries a key set; other 2xx answers are treated as failures
    if response.status != 200 {
        return Err(VerifyError::key_fetch(format!(
            "failed to fetch JWKS: HTTP {}",
            response.status
        )));
    }

    let jwks: JwkSet = response
        .json()
        .map_err(|e| VerifyError::key_fetch(format!("invalid JWKS: {}", e)))?;

    Ok(jwks)
}
