//! Defines the endpoint for deleting a product.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};

use crate::{
    Error,
    database_id::ProductID,
    db::lock_connection,
    product::core::{ProductState, delete_product},
    response,
};

/// A route handler for deleting a product. Its ledger entries are kept.
pub async fn delete_product_endpoint(
    State(state): State<ProductState>,
    Path(product_id): Path<ProductID>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_product(product_id, &connection)?;
    tracing::info!("deleted product {product_id}");

    Ok(response::message(StatusCode::OK, "Product deleted!"))
}
