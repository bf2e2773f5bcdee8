//! Defines the app level error type and its conversion to JSON responses.
use axum::{
    Json,
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing or a field had an invalid value.
    ///
    /// The string is shown to the client, so it should explain what to fix.
    #[error("{0}")]
    Validation(String),

    /// A stock movement used a type other than "IN" or "OUT".
    #[error("Invalid transaction type")]
    InvalidMovementType(String),

    /// An OUT movement asked for more stock than the product has.
    #[error("Insufficient quantity in stock")]
    InsufficientStock {
        /// The product's quantity when the movement was applied.
        available: i64,
        /// The quantity the movement asked for.
        requested: i64,
    },

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("Not found")]
    NotFound,

    /// No product has the requested ID.
    #[error("Product not found")]
    ProductNotFound,

    /// No customer has the requested user ID.
    #[error("Customer not found")]
    CustomerNotFound,

    /// No account has the requested username.
    #[error("User not found")]
    UserNotFound,

    /// The product or customer exists but has no image attached.
    #[error("Image not found")]
    ImageNotFound,

    /// A customer with the same user ID already exists.
    #[error("Data user already exists")]
    DuplicateCustomer(String),

    /// An account with the same username already exists.
    #[error("Username already exists!")]
    DuplicateUsername(String),

    /// The user provided an invalid combination of username and password.
    #[error("Invalid password")]
    InvalidCredentials,

    /// The bearer token was missing, malformed, tampered with or expired.
    #[error("Unauthorized")]
    InvalidToken,

    /// A token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The uploaded image could not be decoded.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// The image could not be re-encoded after resizing.
    #[error("could not encode image: {0}")]
    ImageError(String),

    /// The multipart form could not be parsed.
    #[error("Invalid form data: {0}")]
    MultipartError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl Error {
    /// The HTTP status code that is sent to the client for this error.
    ///
    /// Duplicate customers answer 401 and duplicate usernames answer 404,
    /// which is what existing clients of this API check for.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_)
            | Error::InvalidMovementType(_)
            | Error::InsufficientStock { .. }
            | Error::InvalidImage(_)
            | Error::MultipartError(_) => StatusCode::BAD_REQUEST,
            Error::NotFound
            | Error::ProductNotFound
            | Error::CustomerNotFound
            | Error::UserNotFound
            | Error::ImageNotFound
            | Error::DuplicateUsername(_) => StatusCode::NOT_FOUND,
            Error::DuplicateCustomer(_) | Error::InvalidCredentials | Error::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Error::TokenCreation(_)
            | Error::HashingError(_)
            | Error::ImageError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Error::MultipartError(rejection.body_text())
    }
}

impl From<axum::extract::multipart::MultipartError> for Error {
    fn from(error: axum::extract::multipart::MultipartError) -> Self {
        Error::MultipartError(error.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Any errors that are server side are not intended to be shown to the client.
        if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
            return (status, Json(json!({ "message": "Internal server error" }))).into_response();
        }

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
