//! Account registration, log in and the bearer token guard.

mod log_in;
mod middleware;
mod register;
mod token;

pub use log_in::log_in;
pub use middleware::auth_guard;
pub use register::register_user;
pub use token::{Claims, DEFAULT_TOKEN_DURATION, JwtKeys};
#[cfg(test)]
pub use token::encode_token;
