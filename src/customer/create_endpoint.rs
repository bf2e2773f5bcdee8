//! Defines the endpoint for registering a customer.

use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::Response,
};

use crate::{
    Error,
    customer::core::{CustomerState, NewCustomer, create_customer},
    db::lock_connection,
    image_upload::prepare_image,
    multipart::MultipartForm,
    response,
    timestamp::Timestamp,
    timezone::local_now,
};

/// A route handler for registering a customer from a multipart form with the
/// fields `userId`, `fullname`, `address`, `category`, `type`, `price` and an
/// optional `image` file.
pub async fn create_customer_endpoint(
    State(state): State<CustomerState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, Error> {
    let mut form = MultipartForm::read(multipart?).await?;
    let text = |name| form.text(name).unwrap_or_default().to_owned();

    let new_customer = NewCustomer {
        user_id: text("userId"),
        fullname: text("fullname"),
        address: text("address"),
        category: text("category"),
        customer_type: text("type"),
        price: form.parse("price")?.unwrap_or_default(),
        image: None,
    }
    .validate()?;

    let image = form
        .take_image()
        .map(|bytes| prepare_image(bytes, &state.image_config))
        .transpose()?;
    let now = Timestamp::from(local_now(&state.local_timezone)?);

    let connection = lock_connection(&state.db_connection)?;
    let customer = create_customer(NewCustomer { image, ..new_customer }, now, &connection)?;
    tracing::info!("registered customer {}", customer.user_id);

    Ok(response::data(
        StatusCode::CREATED,
        "Customer registered successfully.",
        customer,
    ))
}
