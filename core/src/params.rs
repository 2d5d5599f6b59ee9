//! Kubernetes OIDC authentication parameters

use serde::{Deserialize, Serialize};

/// Parameters kubectl needs to authenticate to Kubernetes via OIDC.
///
/// Field names are shared by the JSON and form encodings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationParams {
    #[serde(rename = "email", default)]
    pub username: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
    #[serde(rename = "idToken")]
    pub id_token: String,
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: String,
    #[serde(rename = "issuer")]
    pub issuer_url: String,
}

impl AuthenticationParams {
    /// Encode as `application/x-www-form-urlencoded`
    pub fn to_form(&self) -> Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(self)
    }

    /// Decode from an HTML form submission
    pub fn from_form(form: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(form)
    }
}
