//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::Duration;

use crate::{
    Error,
    auth::{DEFAULT_TOKEN_DURATION, JwtKeys},
    db::initialize,
    image_upload::ImageConfig,
    ledger::CustomerPolicy,
    pagination::PaginationConfig,
    password::PasswordHash,
    timezone::get_local_offset,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The keys used to sign and verify bearer tokens.
    pub jwt_keys: JwtKeys,

    /// How long a token issued on log in stays valid.
    pub token_duration: Duration,

    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,

    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,

    /// The config that controls how pages of data are sized.
    pub pagination_config: PaginationConfig,

    /// How uploaded images are shrunk before they are stored.
    pub image_config: ImageConfig,

    /// Whether stock movements must name a registered customer.
    pub customer_policy: CustomerPolicy,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Asia/Jakarta".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized or the timezone is unknown.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            jwt_keys: JwtKeys::new(jwt_secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            password_cost: PasswordHash::DEFAULT_COST,
            local_timezone: local_timezone.to_owned(),
            pagination_config: PaginationConfig::default(),
            image_config: ImageConfig::default(),
            customer_policy: CustomerPolicy::default(),
        })
    }

    /// Set whether stock movements must name a registered customer.
    pub fn with_customer_policy(mut self, customer_policy: CustomerPolicy) -> Self {
        self.customer_policy = customer_policy;
        self
    }

    /// Set how long issued tokens stay valid.
    pub fn with_token_duration(mut self, token_duration: Duration) -> Self {
        self.token_duration = token_duration;
        self
    }

    /// Set the bcrypt cost for new passwords. Tests use a low cost to run quickly.
    pub fn with_password_cost(mut self, password_cost: u32) -> Self {
        self.password_cost = password_cost;
        self
    }

    /// Set the default and maximum page sizes.
    pub fn with_pagination_config(mut self, pagination_config: PaginationConfig) -> Self {
        self.pagination_config = pagination_config;
        self
    }
}
