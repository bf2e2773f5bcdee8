//! Defines the endpoint reporting a product's stock and recent sales.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde::Serialize;

use crate::{
    Error,
    database_id::ProductID,
    date_range::DateRange,
    db::lock_connection,
    ledger::sum_out_quantity,
    product::core::{ProductState, get_product},
    response,
    timezone::local_now,
};

/// The current stock and the quantity sold this week and this month.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCount {
    /// The product's stock right now.
    pub current_quantity: i64,
    /// Units sold from Monday through Sunday of the current week.
    pub quantity_weekly: i64,
    /// Units sold in the current calendar month.
    pub quantity_monthly: i64,
}

/// A route handler for the stock and sales summary of one product.
pub async fn count_product_endpoint(
    State(state): State<ProductState>,
    Path(product_id): Path<ProductID>,
) -> Result<Response, Error> {
    let today = local_now(&state.local_timezone)?.date();

    let connection = lock_connection(&state.db_connection)?;
    let product = get_product(product_id, &connection)?;
    let count = ProductCount {
        current_quantity: product.quantity,
        quantity_weekly: sum_out_quantity(product_id, DateRange::week_of(today), &connection)?,
        quantity_monthly: sum_out_quantity(product_id, DateRange::month_of(today), &connection)?,
    };

    Ok(response::data(
        StatusCode::OK,
        "Count product successfully",
        count,
    ))
}
