//! OIDC token validation
//!
//! Validates ID tokens by verifying signatures against a JWKS and checking
//! the standard claims.

use async_trait::async_trait;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use std::sync::Arc;

use super::claims::{IdTokenClaims, VerifiedIdToken};
use super::jwks::KeySource;
use super::verifier::{IdTokenVerifier, VerifierConfig};
use crate::error::VerifyError;
use crate::platform::{Clock, HttpClient};

/// Verifier backed by a JSON Web Key Set
pub struct JwksVerifier {
    config: VerifierConfig,
    keys: KeySource,
    clock: Arc<dyn Clock>,
}

impl JwksVerifier {
    pub fn new(config: VerifierConfig, keys: KeySource, clock: Arc<dyn Clock>) -> Result<Self, VerifyError> {
        if config.supported_signing_algs.is_empty() {
            return Err(VerifyError::invalid_config(
                "at least one signing algorithm must be supported",
            ));
        }

        if config.client_id.is_empty() && !config.skip_client_id_check {
            return Err(VerifyError::invalid_config(
                "client_id must be provided or skip_client_id_check must be set",
            ));
        }

        if !config.skip_issuer_check {
            validate_issuer_url(&config.issuer)?;
        }

        Ok(Self { config, keys, clock })
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    fn check_claims(&self, claims: &IdTokenClaims) -> Result<(), VerifyError> {
        if !self.config.skip_issuer_check && claims.iss != self.config.issuer {
            return Err(VerifyError::IssuerMismatch {
                expected: self.config.issuer.clone(),
                actual: claims.iss.clone(),
            });
        }

        if !self.config.skip_client_id_check && !claims.aud.contains(&self.config.client_id) {
            return Err(VerifyError::AudienceMismatch {
                expected: self.config.client_id.clone(),
                actual: claims.aud.clone(),
            });
        }

        let now = self.clock.now_secs();
        let leeway = self.config.leeway_secs;

        if !self.config.skip_expiry_check {
            let exp = claims
                .exp
                .ok_or_else(|| VerifyError::malformed("token has no exp claim"))?;
            if now > exp.saturating_add(leeway) {
                return Err(VerifyError::Expired {
                    expired_at: exp,
                    now,
                });
            }
        }

        if let Some(nbf) = claims.nbf {
            if nbf > now.saturating_add(leeway) {
                return Err(VerifyError::NotYetValid {
                    not_before: nbf,
                    now,
                });
            }
        }

        if let Some(iat) = claims.iat {
            if iat > now.saturating_add(leeway) {
                return Err(VerifyError::IssuedInFuture { issued_at: iat, now });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl IdTokenVerifier for JwksVerifier {
    async fn verify(&self, raw: &str, http: &dyn HttpClient) -> Result<VerifiedIdToken, VerifyError> {
        let header = decode_header(raw)
            .map_err(|e| VerifyError::malformed(format!("invalid JWT header: {}", e)))?;

        if !self.config.supported_signing_algs.contains(&header.alg) {
            return Err(VerifyError::UnsupportedAlgorithm {
                alg: format!("{:?}", header.alg),
            });
        }

        let jwks = self.keys.resolve(http).await?;

        // Without a kid every key in the set is a candidate
        let candidates: Vec<&Jwk> = match &header.kid {
            Some(kid) => jwks.find(kid).into_iter().collect(),
            None => jwks.keys.iter().collect(),
        };
        if candidates.is_empty() {
            return Err(VerifyError::KeyNotFound { kid: header.kid });
        }

        let mut payload = None;
        let mut last_error = None;
        for jwk in candidates {
            match verify_signature(raw, jwk, header.alg) {
                Ok(value) => {
                    payload = Some(value);
                    break;
                }
                Err(e) => last_error = Some(e),
            }
        }

        let payload = match (payload, last_error) {
            (Some(Value::Object(map)), _) => map,
            (Some(_), _) => return Err(VerifyError::malformed("claims are not a JSON object")),
            (None, Some(e)) => return Err(e),
            (None, None) => return Err(VerifyError::KeyNotFound { kid: header.kid }),
        };

        let claims: IdTokenClaims = serde_json::from_value(Value::Object(payload.clone()))
            .map_err(|e| VerifyError::malformed(format!("invalid JWT claims: {}", e)))?;

        self.check_claims(&claims)?;

        Ok(VerifiedIdToken::new(claims, payload))
    }
}

/// Check the signature only; time and audience checks run on typed claims
fn verify_signature(raw: &str, jwk: &Jwk, alg: Algorithm) -> Result<Value, VerifyError> {
    let key = DecodingKey::from_jwk(jwk)
        .map_err(|e| VerifyError::signature(format!("invalid JWK: {}", e)))?;

    let mut validation = Validation::new(alg);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Value>(raw, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| VerifyError::signature(e.to_string()))
}

/// Validate issuer URL format per RFC 8414 and OpenID Connect Core 1.0
fn validate_issuer_url(issuer: &str) -> Result<(), VerifyError> {
    let url = url::Url::parse(issuer)
        .map_err(|_| VerifyError::invalid_config(format!("invalid issuer URL '{}'", issuer)))?;

    let is_localhost = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1") | Some("[::1]"));
    if url.scheme() != "https" && !is_localhost {
        return Err(VerifyError::invalid_config("issuer must use HTTPS"));
    }

    if url.query().is_some() {
        return Err(VerifyError::invalid_config("issuer URL must not have query string"));
    }

    if url.fragment().is_some() {
        return Err(VerifyError::invalid_config("issuer URL must not have fragment"));
    }

    if !url.username().is_empty() || url.password().is_some() {
        return Err(VerifyError::invalid_config("issuer URL must not have userinfo"));
    }

    Ok(())
}
