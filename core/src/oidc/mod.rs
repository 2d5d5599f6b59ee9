//! OIDC (OpenID Connect) module
//!
//! Handles ID token verification: key resolution, signature checks and
//! claim validation.

mod claims;
mod jwks;
mod validate;
mod verifier;

pub use claims::{IdTokenClaims, VerifiedIdToken};
pub use jwks::{fetch_jwks, KeySource};
pub use validate::JwksVerifier;
pub use verifier::{IdTokenVerifier, VerifierConfig};
