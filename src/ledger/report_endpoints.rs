//! Defines the reporting endpoints over the stock ledger.

use axum::{
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::ProductID,
    date_range::DateRange,
    db::lock_connection,
    ledger::{
        core::{LedgerState, MovementType},
        report::{DailyQuantity, daily_quantities, distinct_activity_dates, net_totals},
    },
    product::get_product,
    response,
    timezone::local_now,
};

/// How many days before today the daily quantities reach back.
const TRAILING_DAYS: i64 = 30;

/// The optional movement type of the daily quantities.
#[derive(Debug, Default, Deserialize)]
pub struct DailyQuery {
    #[serde(rename = "type")]
    pub movement_type: Option<String>,
}

/// A product's daily quantities over the trailing 30 days.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDailyQuantities {
    pub id: ProductID,
    pub product_name: String,
    pub transactions: Vec<DailyQuantity>,
}

/// A route handler for the per-day quantities of one product over the last 30 days.
pub async fn last_30_days_endpoint(
    State(state): State<LedgerState>,
    Path(product_id): Path<ProductID>,
    query: Result<Query<DailyQuery>, QueryRejection>,
) -> Result<Response, Error> {
    let Query(query) = query?;
    let movement_type = query
        .movement_type
        .filter(|text| !text.trim().is_empty())
        .map(|text| text.trim().parse::<MovementType>())
        .transpose()?;
    let today = local_now(&state.local_timezone)?.date();

    let connection = lock_connection(&state.db_connection)?;
    let product = get_product(product_id, &connection)?;
    let transactions = daily_quantities(
        product_id,
        movement_type,
        DateRange::trailing_days(today, TRAILING_DAYS),
        &connection,
    )?;

    Ok(response::data(
        StatusCode::OK,
        "Transaction in last 30 days",
        ProductDailyQuantities {
            id: product.id,
            product_name: product.name,
            transactions,
        },
    ))
}

/// A route handler for this month's income, expenses and their difference.
pub async fn total_expenses_endpoint(
    State(state): State<LedgerState>,
) -> Result<Response, Error> {
    let today = local_now(&state.local_timezone)?.date();

    let connection = lock_connection(&state.db_connection)?;
    let totals = net_totals(DateRange::month_of(today), &connection)?;

    Ok(response::data(
        StatusCode::OK,
        "Total income and expenses fetched successfully",
        totals,
    ))
}

/// A route handler for every day with ledger activity, newest first.
pub async fn distinct_dates_endpoint(
    State(state): State<LedgerState>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let dates = distinct_activity_dates(&connection)?;

    Ok(response::data(
        StatusCode::OK,
        "All dates fetched successfully",
        dates,
    ))
}
