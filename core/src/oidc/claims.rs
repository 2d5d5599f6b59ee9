//! ID token claim types

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Standard ID token claims checked during verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer
    pub iss: String,

    /// Subject
    #[serde(default)]
    pub sub: String,

    /// Audience (can be string or array)
    #[serde(default, deserialize_with = "deserialize_audience")]
    pub aud: Vec<String>,

    /// Expiration time
    #[serde(default, deserialize_with = "deserialize_numeric_date")]
    pub exp: Option<u64>,

    /// Issued at
    #[serde(default, deserialize_with = "deserialize_numeric_date")]
    pub iat: Option<u64>,

    /// Not before
    #[serde(default, deserialize_with = "deserialize_numeric_date")]
    pub nbf: Option<u64>,

    #[serde(default)]
    pub nonce: Option<String>,

    /// Additional claims
    #[serde(flatten)]
    pub custom_claims: HashMap<String, Value>,
}

/// An ID token that passed signature and claim checks
#[derive(Debug, Clone)]
pub struct VerifiedIdToken {
    pub issuer: String,
    pub subject: String,
    pub audience: Vec<String>,
    pub expiry: Option<u64>,
    pub issued_at: Option<u64>,
    pub nonce: Option<String>,
    payload: Map<String, Value>,
}

impl VerifiedIdToken {
    /// Wrap claims that have already been checked.
    ///
    /// `payload` is the complete claim set, used by [`claims`](Self::claims)
    /// and [`claim`](Self::claim).
    pub fn new(claims: IdTokenClaims, payload: Map<String, Value>) -> Self {
        Self {
            issuer: claims.iss,
            subject: claims.sub,
            audience: claims.aud,
            expiry: claims.exp,
            issued_at: claims.iat,
            nonce: claims.nonce,
            payload,
        }
    }

    /// Decode the full claim set into `T`
    pub fn claims<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(Value::Object(self.payload.clone()))
    }

    /// Decode a single claim; `None` when it is absent or null
    pub fn claim<T: DeserializeOwned>(&self, name: &str) -> serde_json::Result<Option<T>> {
        match self.payload.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some),
        }
    }
}

/// Deserialize audience as either string or array
fn deserialize_audience<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct AudienceVisitor;

    impl<'de> Visitor<'de> for AudienceVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("string or array of strings")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Vec<String>, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Vec<String>, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut values = Vec::new();
            while let Some(value) = seq.next_element()? {
                values.push(value);
            }
            Ok(values)
        }
    }

    deserializer.deserialize_any(AudienceVisitor)
}

/// Deserialize a NumericDate, which some issuers emit as a float
fn deserialize_numeric_date<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct NumericDateVisitor;

    impl<'de> Visitor<'de> for NumericDateVisitor {
        type Value = Option<u64>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("non-negative number of seconds")
        }

        fn visit_u64<E>(self, value: u64) -> std::result::Result<Option<u64>, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_i64<E>(self, value: i64) -> std::result::Result<Option<u64>, E>
        where
            E: de::Error,
        {
            u64::try_from(value)
                .map(Some)
                .map_err(|_| E::custom("negative NumericDate"))
        }

        fn visit_f64<E>(self, value: f64) -> std::result::Result<Option<u64>, E>
        where
            E: de::Error,
        {
            if value.is_finite() && value >= 0.0 {
                Ok(Some(value as u64))
            } else {
                Err(E::custom("invalid NumericDate"))
            }
        }

        fn visit_unit<E>(self) -> std::result::Result<Option<u64>, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> std::result::Result<Option<u64>, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(NumericDateVisitor)
}
