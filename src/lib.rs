//! Stockroom is the backend for a small shop's inventory and point of sale.
//!
//! It keeps a catalog of products with their stock levels, a register of
//! customers, and an append-only stock ledger of IN (restock) and OUT (sale)
//! movements. Reporting endpoints aggregate the ledger into weekly and monthly
//! quantities, income and expense totals, and a searchable history.
//!
//! This library provides a JSON REST API guarded by bearer tokens.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod customer;
mod database_id;
mod date_range;
mod db;
mod endpoints;
mod error;
mod image_upload;
mod ledger;
mod logging;
mod multipart;
mod pagination;
mod password;
mod product;
mod query_filter;
mod response;
mod routing;
mod timestamp;
mod timezone;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::DEFAULT_TOKEN_DURATION;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use image_upload::ImageConfig;
pub use ledger::CustomerPolicy;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use password::PasswordHash;
pub use routing::build_router;
pub use user::{User, UserID, get_user_by_username, set_password};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
