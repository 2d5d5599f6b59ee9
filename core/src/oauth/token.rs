//! Token endpoint response parsing

use serde_json::{Map, Value};

use crate::error::ExchangeError;
use crate::platform::HttpResponse;

/// Tokens returned by a successful authorization code exchange
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    raw: Map<String, Value>,
}

impl TokenSet {
    /// Any field of the raw response, including ones without a typed accessor
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }
}

/// Parse a 2xx token endpoint response.
///
/// JSON is the default; form encoding is accepted for providers that answer
/// with `application/x-www-form-urlencoded` or `text/plain`.
pub(crate) fn parse_token_response(response: &HttpResponse) -> Result<TokenSet, ExchangeError> {
    let raw = if is_form_encoded(response) {
        parse_form_fields(&response.body).map_err(|e| {
            ExchangeError::malformed_response(format!("invalid form-encoded body: {}", e))
        })?
    } else {
        response
            .json::<Map<String, Value>>()
            .map_err(|e| ExchangeError::malformed_response(format!("invalid JSON body: {}", e)))?
    };

    let access_token = string_field(&raw, "access_token")?.unwrap_or_default();
    if access_token.is_empty() {
        return Err(ExchangeError::malformed_response(
            "server response missing access_token",
        ));
    }

    Ok(TokenSet {
        access_token,
        token_type: string_field(&raw, "token_type")?.unwrap_or_default(),
        refresh_token: string_field(&raw, "refresh_token")?.filter(|t| !t.is_empty()),
        expires_in: expires_in(&raw)?,
        raw,
    })
}

/// OAuth2 error body (RFC 6749 section 5.2), if the response carries one
pub(crate) fn parse_error_response(response: &HttpResponse) -> Option<(String, Option<String>)> {
    let raw = if is_form_encoded(response) {
        parse_form_fields(&response.body).ok()?
    } else {
        response.json::<Map<String, Value>>().ok()?
    };

    let error = raw.get("error")?.as_str()?.to_string();
    let description = raw
        .get("error_description")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some((error, description))
}

fn is_form_encoded(response: &HttpResponse) -> bool {
    matches!(
        response.media_type().as_deref(),
        Some("application/x-www-form-urlencoded") | Some("text/plain")
    )
}

fn parse_form_fields(body: &[u8]) -> Result<Map<String, Value>, serde_urlencoded::de::Error> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;
    Ok(pairs
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect())
}

fn string_field(raw: &Map<String, Value>, key: &str) -> Result<Option<String>, ExchangeError> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ExchangeError::malformed_response(format!(
            "field '{}' is not a string",
            key
        ))),
    }
}

/// `expires_in` arrives as a number or, from some providers, a numeric string
fn expires_in(raw: &Map<String, Value>) -> Result<Option<u64>, ExchangeError> {
    let invalid = || ExchangeError::malformed_response("field 'expires_in' is not a number");

    match raw.get("expires_in") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(invalid),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => s.parse::<u64>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}
