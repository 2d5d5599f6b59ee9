//! oidc-extractor: OIDC parameter extraction for Kubernetes credentials
//!
//! Re-exports the platform-agnostic core and provides the native transport
//! (reqwest) and clock. Use [`new_extractor`] to build an extractor that
//! falls back to the standard HTTP client when no transport is configured.

use std::sync::Arc;

pub use oidc_extractor_core::*;

mod transport;

pub use transport::{ReqwestHttpClient, SystemClock};

/// Build an extractor, using a default [`ReqwestHttpClient`] unless
/// `options` already carries a transport.
pub fn new_extractor(
    verifier: Arc<dyn IdTokenVerifier>,
    mut options: ExtractorOptions,
) -> Result<OidcExtractor> {
    if options.http_client.is_none() {
        tracing::debug!("no HTTP client configured, using default reqwest client");
        options.http_client = Some(Arc::new(ReqwestHttpClient::new()));
    }
    OidcExtractor::new(verifier, options)
}

/// Verifier that fetches the issuer's keys from `jwks_uri` and checks time
/// claims against the system clock.
pub fn remote_verifier(
    config: VerifierConfig,
    jwks_uri: impl Into<String>,
) -> std::result::Result<JwksVerifier, VerifyError> {
    JwksVerifier::new(
        config,
        KeySource::Remote {
            jwks_uri: jwks_uri.into(),
        },
        Arc::new(SystemClock),
    )
}
