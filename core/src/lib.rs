//! oidc-extractor-core: platform-agnostic OIDC parameter extraction
//!
//! Exchanges an OAuth2 authorization code for tokens, verifies the returned ID
//! token and packages what a Kubernetes OIDC credential config needs. It
//! depends only on abstract platform traits (HttpClient, Clock) and never
//! imports a concrete HTTP stack or runtime.
//!
//! Every network call is an `.await` point; dropping the `process` future
//! abandons the in-flight request and leaves no partial state behind.

pub mod config;
pub mod error;
pub mod extractor;
pub mod oauth;
pub mod oidc;
pub mod params;
pub mod platform;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{ErrorResponse, ExchangeError, ExtractError, Result, TransportError, VerifyError};
pub use extractor::{Extractor, ExtractorOptions, OidcExtractor};
pub use oauth::{AuthStyle, OAuth2Config, TokenSet};
pub use oidc::{IdTokenClaims, IdTokenVerifier, JwksVerifier, KeySource, VerifiedIdToken, VerifierConfig};
pub use params::AuthenticationParams;
pub use platform::{Clock, HttpClient, HttpResponse};
