//! Defines the endpoint for adding a product to the catalog.

use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::Response,
};

use crate::{
    Error,
    db::lock_connection,
    image_upload::prepare_image,
    multipart::MultipartForm,
    product::core::{NewProduct, ProductState, create_product},
    response,
    timestamp::Timestamp,
    timezone::local_now,
};

const INVALID_INPUT: &str = "Please enter a valid input.";

/// A route handler for creating a product from a multipart form with the
/// fields `name`, `quantity`, `price` and an optional `image` file.
pub async fn create_product_endpoint(
    State(state): State<ProductState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, Error> {
    let mut form = MultipartForm::read(multipart?).await?;

    let invalid_input = |_| Error::Validation(INVALID_INPUT.to_owned());
    let name = form.text("name").map(str::to_owned);
    let quantity = form.parse::<i64>("quantity").map_err(invalid_input)?;
    let price = form.parse::<i64>("price").map_err(invalid_input)?;

    let (Some(name), Some(quantity), Some(price)) = (name, quantity, price) else {
        return Err(Error::Validation(INVALID_INPUT.to_owned()));
    };

    let image = form
        .take_image()
        .map(|bytes| prepare_image(bytes, &state.image_config))
        .transpose()?;
    let new_product = NewProduct::new(&name, quantity, price, image).map_err(invalid_input)?;
    let now = Timestamp::from(local_now(&state.local_timezone)?);

    let connection = lock_connection(&state.db_connection)?;
    let product = create_product(new_product, now, &connection)?;
    tracing::info!("created product {} \"{}\"", product.id, product.name);

    Ok(response::data(
        StatusCode::CREATED,
        "Insert new product successfully.",
        product,
    ))
}
