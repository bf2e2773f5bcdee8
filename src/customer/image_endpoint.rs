//! Defines the endpoint serving a customer's image.

use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::{
    Error,
    customer::core::{CustomerState, get_customer_image},
    db::lock_connection,
    image_upload::image_response,
};

/// A route handler that responds with the raw bytes of a customer's image.
pub async fn get_customer_image_endpoint(
    State(state): State<CustomerState>,
    Path(user_id): Path<String>,
) -> Result<Response, Error> {
    let image = {
        let connection = lock_connection(&state.db_connection)?;
        get_customer_image(&user_id, &connection)?
    };

    Ok(image_response(image))
}
