//! The endpoint that exchanges a username and password for a bearer token.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::token::{JwtKeys, encode_token},
    db::lock_connection,
    user::get_user_by_username,
};

/// The state needed for logging in.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The keys used to sign tokens.
    pub jwt_keys: JwtKeys,
    /// How long issued tokens stay valid.
    pub token_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials entered during log in.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// The account's username.
    pub username: String,
    /// The raw password.
    pub password: String,
}

/// A route handler that checks the credentials and responds with a signed token.
///
/// # Errors
///
/// - 404 if no account has the username,
/// - 401 if the password is wrong,
/// - 500 if the password could not be checked or the token could not be signed.
pub async fn log_in(
    State(state): State<LoginState>,
    payload: Result<Json<LogInData>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(credentials) = payload?;

    let user = {
        let connection = lock_connection(&state.db_connection)?;
        get_user_by_username(credentials.username.trim(), &connection)?
    };

    let is_password_valid = user
        .password_hash
        .verify(&credentials.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_token(
        &user,
        OffsetDateTime::now_utc(),
        state.token_duration,
        &state.jwt_keys,
    )?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Login successful", "token": token })),
    )
        .into_response())
}
