//! The endpoint for creating a login account.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, db::lock_connection, response, user::create_user,
};

/// The role given to accounts registered without one.
const DEFAULT_ROLE: &str = "user";

/// The state needed for registering a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_cost: state.password_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data for registering a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The name used to log in.
    pub username: String,
    /// The raw password.
    pub password: String,
    /// The role embedded in the account's tokens.
    #[serde(default)]
    pub role: Option<String>,
}

/// A route handler for registering a new login account.
///
/// A taken username answers 404 and every other failure answers 401.
pub async fn register_user(
    State(state): State<RegistrationState>,
    payload: Result<Json<RegisterForm>, JsonRejection>,
) -> Response {
    match try_register(&state, payload) {
        Ok(()) => response::message(StatusCode::CREATED, "User registered successfully."),
        Err(error @ Error::DuplicateUsername(_)) => error.into_response(),
        Err(error) => {
            tracing::error!("Failed to register user: {error}");
            response::message(StatusCode::UNAUTHORIZED, "Failed to register user")
        }
    }
}

fn try_register(
    state: &RegistrationState,
    payload: Result<Json<RegisterForm>, JsonRejection>,
) -> Result<(), Error> {
    let Json(form) = payload?;

    let username = form.username.trim();
    if username.is_empty() {
        return Err(Error::Validation("Username must not be empty".to_owned()));
    }

    let role = form
        .role
        .as_deref()
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .unwrap_or(DEFAULT_ROLE);

    let password_hash = PasswordHash::new(&form.password, state.password_cost)?;

    let connection = lock_connection(&state.db_connection)?;
    let user = create_user(username, password_hash, role, &connection)?;
    tracing::info!("registered user {} with role {}", user.id, user.role);

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{endpoints, user::create_user_table, user::get_user_by_username};

    use super::{RegistrationState, register_user};

    fn get_test_state() -> RegistrationState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");

        RegistrationState {
            password_cost: 4,
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn get_test_server(state: RegistrationState) -> TestServer {
        let app = Router::new()
            .route(endpoints::REGISTER, post(register_user))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn register_succeeds() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({ "username": "kasir", "password": "1234", "role": "admin" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        response.assert_json(&json!({ "message": "User registered successfully." }));
        let user = get_user_by_username("kasir", &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(user.role, "admin");
        assert!(user.password_hash.verify("1234").unwrap());
    }

    #[tokio::test]
    async fn role_defaults_to_user() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        server
            .post(endpoints::REGISTER)
            .json(&json!({ "username": "kasir", "password": "1234" }))
            .await
            .assert_status(StatusCode::CREATED);

        let user = get_user_by_username("kasir", &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(user.role, "user");
    }

    #[tokio::test]
    async fn duplicate_username_is_not_found() {
        let server = get_test_server(get_test_state());
        let body = json!({ "username": "kasir", "password": "1234" });
        server.post(endpoints::REGISTER).json(&body).await;

        let response = server.post(endpoints::REGISTER).json(&body).await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({ "message": "Username already exists!" }));
    }

    #[tokio::test]
    async fn missing_password_is_unauthorized() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({ "username": "kasir" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "message": "Failed to register user" }));
    }
}
