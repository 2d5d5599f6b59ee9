//! OAuth2 client configuration

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ExchangeError;

/// How client credentials are presented to the token endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStyle {
    /// HTTP Basic first, then form parameters if the provider rejects the client
    #[default]
    AutoDetect,
    /// `client_id` and `client_secret` as form parameters
    InParams,
    /// HTTP Basic authorization header
    InHeader,
}

/// OAuth2 client configuration for one provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuth2Config {
    /// Client ID
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Authorization endpoint
    pub auth_url: String,
    /// Token exchange endpoint
    pub token_url: String,
    /// Redirect URI registered with the provider
    pub redirect_url: Option<String>,
    /// Scopes to request
    pub scopes: Vec<String>,
    /// Client authentication method at the token endpoint
    pub auth_style: AuthStyle,
}

impl OAuth2Config {
    /// Build the authorization endpoint URL the user is sent to.
    pub fn auth_code_url(&self, state: &str) -> Result<String, ExchangeError> {
        let mut url = Url::parse(&self.auth_url).map_err(|e| {
            ExchangeError::invalid_request(format!("invalid auth URL '{}': {}", self.auth_url, e))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.client_id);
            if let Some(redirect_url) = &self.redirect_url {
                query.append_pair("redirect_uri", redirect_url);
            }
            if !self.scopes.is_empty() {
                query.append_pair("scope", &self.scopes.join(" "));
            }
            query.append_pair("state", state);
        }

        Ok(url.to_string())
    }
}
