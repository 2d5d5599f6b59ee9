//! Authorization code grant (RFC 6749 section 4.1.3)

use base64::{engine::general_purpose::STANDARD, Engine};
use url::{form_urlencoded, Url};

use super::config::{AuthStyle, OAuth2Config};
use super::token::{parse_error_response, parse_token_response, TokenSet};
use crate::config::USER_AGENT;
use crate::error::ExchangeError;
use crate::platform::HttpClient;

/// Redeem an authorization code at the provider's token endpoint
pub async fn exchange_code(
    config: &OAuth2Config,
    code: &str,
    http: &dyn HttpClient,
) -> Result<TokenSet, ExchangeError> {
    if code.is_empty() {
        return Err(ExchangeError::invalid_request("authorization code is empty"));
    }

    Url::parse(&config.token_url).map_err(|e| {
        ExchangeError::invalid_request(format!("invalid token URL '{}': {}", config.token_url, e))
    })?;

    match config.auth_style {
        AuthStyle::InParams => request_token(config, code, false, http).await,
        AuthStyle::InHeader => request_token(config, code, true, http).await,
        AuthStyle::AutoDetect => match request_token(config, code, true, http).await {
            Err(e) if is_client_auth_rejection(&e) => {
                tracing::debug!(
                    token_url = %config.token_url,
                    error = %e,
                    "basic client authentication rejected, retrying with credentials in params"
                );
                request_token(config, code, false, http).await
            }
            result => result,
        },
    }
}

/// One token request with the client credentials in a Basic header or in the body
async fn request_token(
    config: &OAuth2Config,
    code: &str,
    credentials_in_header: bool,
    http: &dyn HttpClient,
) -> Result<TokenSet, ExchangeError> {
    let mut params = vec![("grant_type", "authorization_code"), ("code", code)];
    if let Some(redirect_url) = &config.redirect_url {
        params.push(("redirect_uri", redirect_url.as_str()));
    }

    let basic_auth;
    let mut headers = vec![
        ("Content-Type", "application/x-www-form-urlencoded"),
        ("Accept", "application/json"),
        ("User-Agent", USER_AGENT),
    ];

    if credentials_in_header {
        basic_auth = basic_authorization(&config.client_id, &config.client_secret);
        headers.push(("Authorization", basic_auth.as_str()));
    } else {
        params.push(("client_id", config.client_id.as_str()));
        if !config.client_secret.is_empty() {
            params.push(("client_secret", config.client_secret.as_str()));
        }
    }

    let body = serde_urlencoded::to_string(&params)
        .map_err(|e| ExchangeError::invalid_request(format!("cannot encode request: {}", e)))?;

    let response = http
        .post(&config.token_url, &headers, body.as_bytes())
        .await?;

    if !response.is_success() {
        return Err(match parse_error_response(&response) {
            Some((error, description)) => ExchangeError::Rejected {
                status: response.status,
                error,
                description,
            },
            None => ExchangeError::Status {
                status: response.status,
                body: response.text(),
            },
        });
    }

    parse_token_response(&response)
}

/// The provider refused the client credentials rather than the grant
fn is_client_auth_rejection(err: &ExchangeError) -> bool {
    match err {
        ExchangeError::Rejected { status, error, .. } => {
            matches!(status, 400 | 401) && error == "invalid_client"
        }
        ExchangeError::Status { status, .. } => *status == 401,
        _ => false,
    }
}

/// Client id and secret are form-encoded before base64 (RFC 6749 section 2.3.1)
fn basic_authorization(client_id: &str, client_secret: &str) -> String {
    let encode = |value: &str| form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>();
    let credentials = format!("{}:{}", encode(client_id), encode(client_secret));
    format!("Basic {}", STANDARD.encode(credentials))
}
