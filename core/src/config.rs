//! Shared constants and defaults

/// Token response field carrying the ID token
pub const ID_TOKEN_FIELD: &str = "id_token";

/// Claim mapped to the username unless configured otherwise
pub const DEFAULT_USERNAME_CLAIM: &str = "email";

/// Allowed clock skew when checking exp, nbf and iat (seconds)
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

/// User-Agent sent with every outbound request
pub const USER_AGENT: &str = concat!("oidc-extractor/", env!("CARGO_PKG_VERSION"));
