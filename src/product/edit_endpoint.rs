//! Defines the endpoint for editing a product's name and price.

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
    product::core::{ProductPatch, ProductState, update_product},
    response,
    timestamp::Timestamp,
    timezone::local_now,
};

/// The editable fields of a product. Any other fields in the body are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct EditProductForm {
    /// A new display name.
    #[serde(default)]
    pub name: Option<String>,
    /// A new unit price.
    #[serde(default)]
    pub price: Option<i64>,
}

/// A route handler for updating a product's name and/or price.
pub async fn edit_product_endpoint(
    State(state): State<ProductState>,
    Path(product_id): Path<ProductID>,
    form: Result<Json<EditProductForm>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(form) = form?;
    let patch = ProductPatch {
        name: form.name,
        price: form.price,
    };
    let now = Timestamp::from(local_now(&state.local_timezone)?);

    let connection = lock_connection(&state.db_connection)?;
    let product = update_product(product_id, &patch, now, &connection)?;

    Ok(response::data(StatusCode::OK, "Product updated", product))
}
