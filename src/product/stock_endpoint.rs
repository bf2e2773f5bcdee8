//! Defines the endpoint that overwrites a product's stock directly.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;

use crate::{
    Error,
    database_id::ProductID,
    db::lock_connection,
    product::core::{ProductState, set_stock},
    response,
    timestamp::Timestamp,
    timezone::local_now,
};

/// The new stock level.
#[derive(Debug, Deserialize)]
pub struct StockForm {
    /// The quantity to store, replacing the current one.
    pub quantity: i64,
}

/// A route handler that sets a product's stock without writing a ledger entry.
pub async fn update_stock_endpoint(
    State(state): State<ProductState>,
    Path(product_id): Path<ProductID>,
    form: Result<Json<StockForm>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(form) = form?;
    let now = Timestamp::from(local_now(&state.local_timezone)?);

    let connection = lock_connection(&state.db_connection)?;
    let product = set_stock(product_id, form.quantity, now, &connection)?;

    Ok(response::data(
        StatusCode::OK,
        "Stock updated successfully.",
        product,
    ))
}
