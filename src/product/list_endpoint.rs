//! Defines the endpoint for listing the catalog.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;

use crate::{
    Error,
    db::lock_connection,
    product::core::{ProductState, list_products},
    response,
};

/// The query parameters for listing products.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Only return products with exactly this name.
    pub name: Option<String>,
}

/// A route handler that lists products ordered by ID.
pub async fn list_products_endpoint(
    State(state): State<ProductState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Response, Error> {
    let Query(query) = query?;
    let name = query.name.as_deref().filter(|name| !name.is_empty());

    let connection = lock_connection(&state.db_connection)?;
    let products = list_products(name, &connection)?;

    Ok(response::data(
        StatusCode::OK,
        "Products fetched successfully",
        products,
    ))
}
