//! Signing and verifying the JSON Web Tokens handed out on log in.

use std::fmt::Debug;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, User};

/// How long a freshly issued token stays valid.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::days(30);

/// The keys used to sign and verify tokens, derived from one shared secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Create the HS256 keys from `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtKeys { .. }")
    }
}

/// The contents of a JSON Web Token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the account the token was issued to.
    pub id: i64,
    /// Accounts have no email address, so this is always null.
    pub email: Option<String>,
    /// The role of the account, e.g. "admin".
    pub role: String,
    /// The time the token was issued, in seconds since the Unix epoch.
    pub iat: i64,
    /// The expiry time of the token, in seconds since the Unix epoch.
    pub exp: i64,
}

/// Sign a token for `user` that expires `duration` after `issued_at`.
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    user: &User,
    issued_at: OffsetDateTime,
    duration: Duration,
    keys: &JwtKeys,
) -> Result<String, Error> {
    let claims = Claims {
        id: user.id.as_i64(),
        email: None,
        role: user.role.clone(),
        iat: issued_at.unix_timestamp(),
        exp: (issued_at + duration).unix_timestamp(),
    };

    encode(&Header::default(), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the token is malformed, was signed with
/// another key, or has expired.
pub fn decode_token(token: &str, keys: &JwtKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, &keys.decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("rejected bearer token: {error}");
            Error::InvalidToken
        })
}
