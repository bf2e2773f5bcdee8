//! Defines the endpoint that records a stock movement.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use time::UtcOffset;

use crate::{
    Error,
    auth::Claims,
    database_id::ProductID,
    db::lock_connection,
    ledger::core::{LedgerState, Movement, MovementType, record_movement},
    response,
    timestamp::Timestamp,
    timezone::local_now,
};

/// A JSON value that front ends send either as a number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(i64),
    Text(String),
}

impl NumberOrText {
    fn into_text(self) -> String {
        match self {
            NumberOrText::Number(number) => number.to_string(),
            NumberOrText::Text(text) => text,
        }
    }

    fn to_number(&self) -> Option<i64> {
        match self {
            NumberOrText::Number(number) => Some(*number),
            NumberOrText::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// The body of a movement request. Every field but `created_at` is required.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementForm {
    /// The customer the movement is for.
    pub user_id: Option<NumberOrText>,
    pub product_id: Option<NumberOrText>,
    #[serde(rename = "type")]
    pub movement_type: Option<String>,
    pub quantity: Option<NumberOrText>,
    pub price: Option<NumberOrText>,
    pub category: Option<String>,
    /// Back-dates the entry, e.g. "2024-05-01 09:00:00".
    pub created_at: Option<String>,
}

fn all_fields_required() -> Error {
    Error::Validation("All fields are required".to_owned())
}

fn parse_movement(form: MovementForm, local_offset: UtcOffset) -> Result<Movement, Error> {
    let (
        Some(user_id),
        Some(product_id),
        Some(movement_type),
        Some(quantity),
        Some(price),
        Some(category),
    ) = (
        form.user_id,
        form.product_id,
        form.movement_type,
        form.quantity,
        form.price,
        form.category,
    )
    else {
        return Err(all_fields_required());
    };

    let product_id: ProductID = product_id
        .to_number()
        .ok_or_else(|| Error::Validation("Product ID must be a number".to_owned()))?;

    let (Some(quantity), Some(price)) = (quantity.to_number(), price.to_number()) else {
        return Err(Error::Validation(
            "Quantity and price must be positive numbers".to_owned(),
        ));
    };

    let movement_type: MovementType = movement_type.parse()?;

    let created_at = form
        .created_at
        .filter(|text| !text.trim().is_empty())
        .map(|text| Timestamp::parse(text.trim(), local_offset))
        .transpose()
        .map_err(|_| Error::Validation("Invalid createdAt".to_owned()))?;

    Movement::new(
        product_id,
        movement_type,
        quantity,
        price,
        &user_id.into_text(),
        &category,
    )
    .map(|movement| movement.created_at(created_at))
}

/// A route handler that applies a movement to a product's stock and records
/// it in the ledger.
pub async fn create_movement_endpoint(
    State(state): State<LedgerState>,
    Extension(claims): Extension<Claims>,
    form: Result<Json<MovementForm>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(form) = form?;
    let now = local_now(&state.local_timezone)?;
    let movement = parse_movement(form, now.offset())?;
    let now = Timestamp::from(now);

    let connection = lock_connection(&state.db_connection)?;
    let entry = record_movement(movement, state.customer_policy, now, &connection)?;

    tracing::info!(
        "user {} recorded {} of {} units of product {}",
        claims.id,
        entry.movement_type,
        entry.quantity,
        entry.product_id
    );

    Ok(response::data(
        StatusCode::CREATED,
        "Transaction recorded successfully",
        entry,
    ))
}
