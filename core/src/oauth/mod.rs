//! OAuth2 client side of the authorization code grant
//!
//! Builds the authorization URL and redeems the returned code for tokens.

mod config;
mod exchange;
mod token;

pub use config::{AuthStyle, OAuth2Config};
pub use exchange::exchange_code;
pub use token::TokenSet;
