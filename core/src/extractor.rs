//! OIDC extractor
//!
//! Exchanges an authorization code, verifies the returned ID token and
//! collects what kubectl needs to authenticate as the token's subject.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::config::{DEFAULT_USERNAME_CLAIM, ID_TOKEN_FIELD};
use crate::error::{ExtractError, Result};
use crate::oauth::{self, OAuth2Config};
use crate::oidc::IdTokenVerifier;
use crate::params::AuthenticationParams;
use crate::platform::HttpClient;

/// Performs OIDC validation, extracting the information required for
/// Kubernetes authentication along the way.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn process(&self, config: &OAuth2Config, code: &str) -> Result<AuthenticationParams>;
}

/// Construction options for [`OidcExtractor`]
#[derive(Clone)]
pub struct ExtractorOptions {
    /// Transport for the code exchange and key fetches
    pub http_client: Option<Arc<dyn HttpClient>>,
    /// Claim copied into `AuthenticationParams::username`
    pub username_claim: String,
    /// Fail when the username claim is absent instead of leaving it empty
    pub require_username: bool,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            http_client: None,
            username_claim: DEFAULT_USERNAME_CLAIM.to_string(),
            require_username: true,
        }
    }
}

impl ExtractorOptions {
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http);
        self
    }
}

/// [`Extractor`] backed by an OAuth2 token endpoint and an ID token verifier.
///
/// Immutable after construction; clones share the verifier and transport.
#[derive(Clone)]
pub struct OidcExtractor {
    verifier: Arc<dyn IdTokenVerifier>,
    http: Arc<dyn HttpClient>,
    username_claim: String,
    require_username: bool,
}

impl OidcExtractor {
    pub fn new(verifier: Arc<dyn IdTokenVerifier>, options: ExtractorOptions) -> Result<Self> {
        let http = options
            .http_client
            .ok_or_else(|| ExtractError::invalid_option("no HTTP client configured"))?;

        if options.username_claim.is_empty() {
            return Err(ExtractError::invalid_option("username claim cannot be empty"));
        }

        Ok(Self {
            verifier,
            http,
            username_claim: options.username_claim,
            require_username: options.require_username,
        })
    }

    pub async fn process(&self, config: &OAuth2Config, code: &str) -> Result<AuthenticationParams> {
        // 1. Redeem the code
        tracing::debug!(token_url = %config.token_url, auth_style = ?config.auth_style, "exchanging authorization code");
        let token = oauth::exchange_code(config, code, self.http.as_ref())
            .await
            .map_err(|e| {
                tracing::warn!(token_url = %config.token_url, error = %e, "code exchange failed");
                ExtractError::Exchange(e)
            })?;
        tracing::debug!(
            token_url = %config.token_url,
            has_refresh_token = token.refresh_token.is_some(),
            "authorization code exchanged"
        );

        // 2. The ID token only exists if the provider honoured the openid scope
        let id_token = match token.extra(ID_TOKEN_FIELD).and_then(Value::as_str) {
            Some(id_token) => id_token.to_string(),
            None => {
                tracing::warn!(token_url = %config.token_url, "token response has no ID token");
                return Err(ExtractError::MissingIdToken);
            }
        };

        // 3. Verify with the same transport
        let verified = self
            .verifier
            .verify(&id_token, self.http.as_ref())
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "ID token verification failed");
                ExtractError::Verification(e)
            })?;

        // 4. Config-derived fields are fixed here; claims never overwrite them
        let mut params = AuthenticationParams {
            username: String::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            id_token,
            refresh_token: token.refresh_token.unwrap_or_default(),
            issuer_url: verified.issuer.clone(),
        };

        // 5. Username from its claim
        let username = verified
            .claim::<String>(&self.username_claim)
            .map_err(ExtractError::Claims)?;
        match username {
            Some(username) => params.username = username,
            None if self.require_username => {
                return Err(ExtractError::MissingUsername {
                    claim: self.username_claim.clone(),
                })
            }
            None => {}
        }

        tracing::debug!(issuer = %params.issuer_url, subject = %verified.subject, "extracted OIDC parameters");

        Ok(params)
    }
}

#[async_trait]
impl Extractor for OidcExtractor {
    async fn process(&self, config: &OAuth2Config, code: &str) -> Result<AuthenticationParams> {
        OidcExtractor::process(self, config, code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExchangeError, VerifyError};
    use crate::oidc::{JwksVerifier, KeySource, VerifiedIdToken, VerifierConfig};
    use crate::platform::HttpResponse;
    use crate::test_support::{
        json_response, sign_token, test_jwks, valid_claims, MockClock, MockHttp, CLIENT_ID, ISSUER,
        NOW,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TOKEN_URL: &str = "https://issuer.example/token";
    const JWKS_URI: &str = "https://issuer.example/keys";

    fn oauth_config() -> OAuth2Config {
        OAuth2Config {
            client_id: CLIENT_ID.to_string(),
            client_secret: "xyz".to_string(),
            auth_url: "https://issuer.example/authorize".to_string(),
            token_url: TOKEN_URL.to_string(),
            scopes: vec!["openid".to_string(), "email".to_string()],
            ..OAuth2Config::default()
        }
    }

    fn static_verifier() -> Arc<dyn IdTokenVerifier> {
        Arc::new(
            JwksVerifier::new(
                VerifierConfig::new(ISSUER, CLIENT_ID),
                KeySource::Static(test_jwks()),
                Arc::new(MockClock(NOW)),
            )
            .unwrap(),
        )
    }

    fn remote_verifier() -> Arc<dyn IdTokenVerifier> {
        Arc::new(
            JwksVerifier::new(
                VerifierConfig::new(ISSUER, CLIENT_ID),
                KeySource::Remote {
                    jwks_uri: JWKS_URI.to_string(),
                },
                Arc::new(MockClock(NOW)),
            )
            .unwrap(),
        )
    }

    fn token_response(body: Value) -> (String, HttpResponse) {
        (TOKEN_URL.to_string(), json_response(200, body))
    }

    fn jwks_response() -> (String, HttpResponse) {
        (
            JWKS_URI.to_string(),
            json_response(200, serde_json::to_value(test_jwks()).unwrap()),
        )
    }

    fn extractor(verifier: Arc<dyn IdTokenVerifier>, http: Arc<MockHttp>) -> OidcExtractor {
        OidcExtractor::new(verifier, ExtractorOptions::default().with_http_client(http)).unwrap()
    }

    /// Verifier that counts calls and accepts everything
    struct CountingVerifier {
        calls: AtomicUsize,
        payload: Value,
    }

    #[async_trait]
    impl IdTokenVerifier for CountingVerifier {
        async fn verify(&self, _raw: &str, _http: &dyn HttpClient) -> std::result::Result<VerifiedIdToken, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let payload = self.payload.as_object().cloned().unwrap_or_default();
            let claims = serde_json::from_value(self.payload.clone()).map_err(|e| VerifyError::malformed(e.to_string()))?;
            Ok(VerifiedIdToken::new(claims, payload))
        }
    }

    /// Collects formatted log output
    #[derive(Clone, Default)]
    struct LogCapture(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogCapture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[tokio::test]
    async fn test_process_logs_exchange_without_secrets() {
        let capture = LogCapture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let http = Arc::new(MockHttp::new(vec![token_response(serde_json::json!({
            "access_token": "at",
            "refresh_token": "r1",
            "id_token": sign_token(&valid_claims())
        }))]));
        extractor(static_verifier(), http)
            .process(&oauth_config(), "auth-code-1")
            .await
            .unwrap();

        let logs = capture.contents();
        assert!(logs.contains("exchanging authorization code"));
        assert!(logs.contains("authorization code exchanged"));
        assert!(logs.contains(TOKEN_URL));
        assert!(!logs.contains("auth-code-1"));
        assert!(!logs.contains("xyz"));
    }

    #[tokio::test]
    async fn test_process_success() {
        let id_token = sign_token(&valid_claims());
        let http = Arc::new(MockHttp::new(vec![token_response(serde_json::json!({
            "access_token": "at",
            "token_type": "Bearer",
            "refresh_token": "r1",
            "id_token": id_token
        }))]));

        let params = extractor(static_verifier(), http)
            .process(&oauth_config(), "auth-code-1")
            .await
            .unwrap();

        assert_eq!(
            params,
            AuthenticationParams {
                username: "user@example.com".to_string(),
                client_id: CLIENT_ID.to_string(),
                client_secret: "xyz".to_string(),
                id_token,
                refresh_token: "r1".to_string(),
                issuer_url: ISSUER.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_process_without_refresh_token() {
        let http = Arc::new(MockHttp::new(vec![token_response(serde_json::json!({
            "access_token": "at",
            "id_token": sign_token(&valid_claims())
        }))]));

        let params = extractor(static_verifier(), http)
            .process(&oauth_config(), "auth-code-1")
            .await
            .unwrap();
        assert_eq!(params.refresh_token, "");
    }

    #[tokio::test]
    async fn test_process_uses_configured_transport_for_keys() {
        let http = Arc::new(MockHttp::new(vec![
            token_response(serde_json::json!({
                "access_token": "at",
                "id_token": sign_token(&valid_claims())
            })),
            jwks_response(),
        ]));

        extractor(remote_verifier(), http.clone())
            .process(&oauth_config(), "auth-code-1")
            .await
            .unwrap();

        let urls: Vec<String> = http.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec![TOKEN_URL.to_string(), JWKS_URI.to_string()]);
    }

    #[tokio::test]
    async fn test_process_missing_id_token() {
        let http = Arc::new(MockHttp::new(vec![
            token_response(serde_json::json!({"access_token": "at", "refresh_token": "r1"})),
            jwks_response(),
        ]));

        let err = extractor(remote_verifier(), http.clone())
            .process(&oauth_config(), "auth-code-1")
            .await
            .unwrap_err();

        assert!(err.is_missing_id_token());
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_process_id_token_not_a_string() {
        let http = Arc::new(MockHttp::new(vec![token_response(serde_json::json!({
            "access_token": "at",
            "id_token": {"nested": true}
        }))]));

        let err = extractor(static_verifier(), http)
            .process(&oauth_config(), "auth-code-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::MissingIdToken));
    }

    #[tokio::test]
    async fn test_process_exchange_failure_skips_verification() {
        let http = Arc::new(MockHttp::new(vec![(
            TOKEN_URL.to_string(),
            json_response(400, serde_json::json!({"error": "invalid_grant"})),
        )]));
        let verifier = Arc::new(CountingVerifier {
            calls: AtomicUsize::new(0),
            payload: valid_claims(),
        });

        let err = extractor(verifier.clone(), http)
            .process(&oauth_config(), "bad-code")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExtractError::Exchange(ExchangeError::Rejected { .. })
        ));
        assert!(err.to_string().starts_with("cannot exchange code for token"));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_process_verification_failure() {
        let mut claims = valid_claims();
        claims["iss"] = serde_json::json!("https://evil.example");
        let http = Arc::new(MockHttp::new(vec![token_response(serde_json::json!({
            "access_token": "at",
            "id_token": sign_token(&claims)
        }))]));

        let err = extractor(static_verifier(), http)
            .process(&oauth_config(), "auth-code-1")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExtractError::Verification(VerifyError::IssuerMismatch { .. })
        ));
        assert!(err.to_string().starts_with("cannot verify ID token"));
    }

    #[tokio::test]
    async fn test_process_undecodable_claims() {
        let mut claims = valid_claims();
        claims["email"] = serde_json::json!(42);
        let http = Arc::new(MockHttp::new(vec![token_response(serde_json::json!({
            "access_token": "at",
            "id_token": sign_token(&claims)
        }))]));

        let err = extractor(static_verifier(), http)
            .process(&oauth_config(), "auth-code-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Claims(_)));
        assert!(err.to_string().starts_with("cannot extract claims from ID token"));
    }

    #[tokio::test]
    async fn test_process_missing_email_is_an_error() {
        let mut claims = valid_claims();
        claims.as_object_mut().unwrap().remove("email");
        let http = Arc::new(MockHttp::new(vec![token_response(serde_json::json!({
            "access_token": "at",
            "id_token": sign_token(&claims)
        }))]));

        let err = extractor(static_verifier(), http)
            .process(&oauth_config(), "auth-code-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::MissingUsername { ref claim } if claim == "email"));
    }

    #[tokio::test]
    async fn test_process_missing_email_allowed() {
        let mut claims = valid_claims();
        claims.as_object_mut().unwrap().remove("email");
        let http = Arc::new(MockHttp::new(vec![token_response(serde_json::json!({
            "access_token": "at",
            "id_token": sign_token(&claims)
        }))]));

        let options = ExtractorOptions {
            require_username: false,
            ..ExtractorOptions::default()
        }
        .with_http_client(http);
        let params = OidcExtractor::new(static_verifier(), options)
            .unwrap()
            .process(&oauth_config(), "auth-code-1")
            .await
            .unwrap();
        assert_eq!(params.username, "");
        assert_eq!(params.issuer_url, ISSUER);
    }

    #[tokio::test]
    async fn test_process_custom_username_claim() {
        let mut claims = valid_claims();
        claims["preferred_username"] = serde_json::json!("jdoe");
        let http = Arc::new(MockHttp::new(vec![token_response(serde_json::json!({
            "access_token": "at",
            "id_token": sign_token(&claims)
        }))]));

        let options = ExtractorOptions {
            username_claim: "preferred_username".to_string(),
            ..ExtractorOptions::default()
        }
        .with_http_client(http);
        let params = OidcExtractor::new(static_verifier(), options)
            .unwrap()
            .process(&oauth_config(), "auth-code-1")
            .await
            .unwrap();
        assert_eq!(params.username, "jdoe");
    }

    #[tokio::test]
    async fn test_claims_do_not_overwrite_config_fields() {
        let mut claims = valid_claims();
        claims["clientID"] = serde_json::json!("spoofed");
        claims["clientSecret"] = serde_json::json!("spoofed");
        claims["issuer"] = serde_json::json!("https://spoofed.example");
        let http = Arc::new(MockHttp::new(vec![token_response(serde_json::json!({
            "access_token": "at",
            "id_token": sign_token(&claims)
        }))]));

        let params = extractor(static_verifier(), http)
            .process(&oauth_config(), "auth-code-1")
            .await
            .unwrap();
        assert_eq!(params.client_id, CLIENT_ID);
        assert_eq!(params.client_secret, "xyz");
        assert_eq!(params.issuer_url, ISSUER);
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_independent() {
        let id_token = sign_token(&valid_claims());
        let http = Arc::new(MockHttp::new(vec![token_response(serde_json::json!({
            "access_token": "at",
            "id_token": id_token
        }))]));
        let extractor = extractor(static_verifier(), http.clone());
        let other = extractor.clone();

        let config = oauth_config();
        let (a, b) = tokio::join!(
            extractor.process(&config, "code-a"),
            other.process(&config, "code-b")
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(http.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_extractor_trait_object() {
        let http = Arc::new(MockHttp::new(vec![token_response(serde_json::json!({
            "access_token": "at",
            "id_token": sign_token(&valid_claims())
        }))]));
        let boxed: Box<dyn Extractor> = Box::new(extractor(static_verifier(), http));

        let params = boxed.process(&oauth_config(), "auth-code-1").await.unwrap();
        assert_eq!(params.username, "user@example.com");
    }

    #[test]
    fn test_new_requires_http_client() {
        let err = OidcExtractor::new(static_verifier(), ExtractorOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, ExtractError::InvalidOption { .. }));
        assert!(err.to_string().starts_with("cannot apply OIDC option"));
    }

    #[test]
    fn test_new_rejects_empty_username_claim() {
        let options = ExtractorOptions {
            username_claim: String::new(),
            ..ExtractorOptions::default()
        }
        .with_http_client(Arc::new(MockHttp::new(vec![])));

        assert!(matches!(
            OidcExtractor::new(static_verifier(), options),
            Err(ExtractError::InvalidOption { .. })
        ));
    }
}
