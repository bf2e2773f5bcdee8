//! The searchable, paginated history of ledger entries.

use rusqlite::{Connection, Row, params_from_iter};
use serde::Serialize;
use time::Date;

use crate::{
    Error, ledger::MovementType, pagination::Page, query_filter::Predicates,
    timestamp::Timestamp,
};

const SEARCH_COLUMNS: [&str; 5] = [
    "p.name",
    "l.category",
    "c.fullname",
    "l.created_at",
    "l.movement_type",
];

/// Narrows the history. Every field that is set must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    /// Substring of the product name, category, customer name, timestamp or type.
    pub search: Option<String>,
    pub movement_type: Option<MovementType>,
    /// Only entries made on this local date.
    pub date: Option<Date>,
}

/// A ledger entry joined with the names of its product and customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    #[serde(rename = "productName")]
    pub product_name: String,
    #[serde(rename = "transactionCategory")]
    pub category: String,
    #[serde(rename = "transactionQuantity")]
    pub quantity: i64,
    #[serde(rename = "transactionDate")]
    pub created_at: Timestamp,
    #[serde(rename = "customerName")]
    pub customer_name: String,
    /// The customer's national ID number, i.e. their user ID.
    #[serde(rename = "NIK")]
    pub customer_id: String,
    #[serde(rename = "transactionPrice")]
    pub price: i64,
    #[serde(rename = "transactionTotal")]
    pub total_price: i64,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
}

fn map_history_row(row: &Row) -> Result<HistoryRecord, rusqlite::Error> {
    Ok(HistoryRecord {
        product_name: row.get(0)?,
        category: row.get(1)?,
        quantity: row.get(2)?,
        created_at: row.get(3)?,
        customer_name: row.get(4)?,
        customer_id: row.get(5)?,
        price: row.get(6)?,
        total_price: row.get(7)?,
        movement_type: row.get(8)?,
    })
}

/// Get one page of history matching `filter`, newest first, and the total
/// number of matching entries.
///
/// Entries whose product or customer no longer exists, or never existed, are
/// left out.
pub fn query_history(
    filter: &HistoryFilter,
    page: Page,
    connection: &Connection,
) -> Result<(Vec<HistoryRecord>, u64), Error> {
    let mut predicates = Predicates::new();

    if let Some(search) = &filter.search {
        predicates.contains_any(&SEARCH_COLUMNS, search);
    }

    if let Some(movement_type) = filter.movement_type {
        predicates.equals("l.movement_type", movement_type.as_str().to_owned());
    }

    if let Some(date) = filter.date {
        predicates.date_equals("l.created_at", date);
    }

    let from_clause = format!(
        "FROM ledger_entry l
        INNER JOIN product p ON p.id = l.product_id
        INNER JOIN customer c ON c.user_id = l.customer_id
        {}",
        predicates.where_clause()
    );

    let total_records: i64 = connection.query_row(
        &format!("SELECT COUNT(*) {from_clause}"),
        params_from_iter(predicates.params().iter()),
        |row| row.get(0),
    )?;

    let limit = predicates.bind(page.size as i64);
    let offset = predicates.bind(page.offset() as i64);
    let query = format!(
        "SELECT p.name, l.category, l.quantity, l.created_at, c.fullname, c.user_id,
            l.price, l.total_price, l.movement_type
        {from_clause}
        ORDER BY l.created_at DESC, l.id DESC
        LIMIT {limit} OFFSET {offset}"
    );

    let records = connection
        .prepare(&query)?
        .query_map(params_from_iter(predicates.params().iter()), map_history_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((records, u64::try_from(total_records).unwrap_or_default()))
}
