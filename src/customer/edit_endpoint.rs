//! Defines the endpoint for updating a customer.

use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::Response,
};

use crate::{
    Error,
    customer::core::{CustomerPatch, CustomerState, update_customer},
    db::lock_connection,
    image_upload::prepare_image,
    multipart::MultipartForm,
    response,
    timestamp::Timestamp,
    timezone::local_now,
};

/// A route handler for updating the customer named by the `userId` field of a
/// multipart form.
///
/// Blank fields keep their stored values, and the image is only replaced when
/// a new one is uploaded.
pub async fn edit_customer_endpoint(
    State(state): State<CustomerState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, Error> {
    let mut form = MultipartForm::read(multipart?).await?;

    let Some(user_id) = form.text("userId").map(str::to_owned) else {
        return Err(Error::Validation("userId is required".to_owned()));
    };
    let text = |name| form.text(name).map(str::to_owned);

    let mut patch = CustomerPatch {
        fullname: text("fullname"),
        address: text("address"),
        category: text("category"),
        customer_type: text("type"),
        price: form.parse("price")?,
        image: None,
    };
    patch.image = form
        .take_image()
        .map(|bytes| prepare_image(bytes, &state.image_config))
        .transpose()?;
    let now = Timestamp::from(local_now(&state.local_timezone)?);

    let connection = lock_connection(&state.db_connection)?;
    let customer = update_customer(&user_id, &patch, now, &connection)?;

    Ok(response::data(
        StatusCode::OK,
        "Customer updated successfully.",
        customer,
    ))
}
