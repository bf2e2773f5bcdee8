//! Defines the endpoint serving a product's image.

use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::{
    Error,
    database_id::ProductID,
    db::lock_connection,
    image_upload::image_response,
    product::core::{ProductState, get_product_image},
};

/// A route handler that responds with the raw bytes of a product's image.
pub async fn get_product_image_endpoint(
    State(state): State<ProductState>,
    Path(product_id): Path<ProductID>,
) -> Result<Response, Error> {
    let image = {
        let connection = lock_connection(&state.db_connection)?;
        get_product_image(product_id, &connection)?
    };

    Ok(image_response(image))
}
