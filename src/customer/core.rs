//! The customer table and the queries that read and write it.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::{
    Connection, OptionalExtension, Row,
    ffi::{SQLITE_CONSTRAINT_PRIMARYKEY, SQLITE_CONSTRAINT_UNIQUE},
    params_from_iter,
};
use serde::Serialize;

use crate::{
    AppState, Error, ImageConfig,
    pagination::{Page, PaginationConfig},
    query_filter::Predicates,
    timestamp::Timestamp,
};

const CUSTOMER_COLUMNS: &str = "user_id, fullname, address, category, customer_type, price, \
     image IS NOT NULL, created_at, updated_at";

/// The columns matched by the free-text customer search.
const SEARCH_COLUMNS: [&str; 3] = ["user_id", "fullname", "category"];

/// The state shared by the customer endpoints.
#[derive(Debug, Clone)]
pub struct CustomerState {
    /// The database connection for managing customers.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,
    /// How uploaded images are shrunk before they are stored.
    pub image_config: ImageConfig,
    /// The default and maximum page sizes of the customer list.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for CustomerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            image_config: state.image_config.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// A registered customer, identified by an externally issued ID such as a national ID number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub user_id: String,
    pub fullname: String,
    pub address: String,
    pub category: String,
    #[serde(rename = "type")]
    pub customer_type: String,
    /// The agreed unit price for this customer.
    pub price: i64,
    pub has_image: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The validated data for registering a customer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub user_id: String,
    pub fullname: String,
    pub address: String,
    pub category: String,
    pub customer_type: String,
    pub price: i64,
    pub image: Option<Vec<u8>>,
}

impl NewCustomer {
    /// Check that every text field is filled in and the price is positive.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] naming the first invalid field.
    pub fn validate(self) -> Result<Self, Error> {
        let text_fields = [
            ("userId", &self.user_id),
            ("fullname", &self.fullname),
            ("address", &self.address),
            ("category", &self.category),
            ("type", &self.customer_type),
        ];

        if let Some((name, _)) = text_fields
            .iter()
            .find(|(_, value)| value.trim().is_empty())
        {
            return Err(Error::Validation(format!("{name} is required")));
        }

        if self.price <= 0 {
            return Err(Error::Validation("Price must be a positive number".to_owned()));
        }

        Ok(self)
    }
}

/// Changes to a customer. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerPatch {
    pub fullname: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub customer_type: Option<String>,
    pub price: Option<i64>,
    pub image: Option<Vec<u8>>,
}

/// Filters for the customer list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerFilter {
    /// Only customers of exactly this type.
    pub customer_type: Option<String>,
    /// Text that must appear in the user ID, full name or category.
    pub search: Option<String>,
}

pub fn create_customer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS customer (
            user_id TEXT PRIMARY KEY NOT NULL,
            fullname TEXT NOT NULL,
            address TEXT NOT NULL,
            category TEXT NOT NULL,
            customer_type TEXT NOT NULL,
            price INTEGER NOT NULL,
            image BLOB,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub fn map_customer_row(row: &Row) -> Result<Customer, rusqlite::Error> {
    Ok(Customer {
        user_id: row.get(0)?,
        fullname: row.get(1)?,
        address: row.get(2)?,
        category: row.get(3)?,
        customer_type: row.get(4)?,
        price: row.get(5)?,
        has_image: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Insert a customer stamped with `now`.
///
/// # Errors
///
/// Returns [Error::DuplicateCustomer] if the user ID is taken. The existing
/// customer is left untouched.
pub fn create_customer(
    customer: NewCustomer,
    now: Timestamp,
    connection: &Connection,
) -> Result<Customer, Error> {
    connection
        .query_row(
            &format!(
                "INSERT INTO customer
                    (user_id, fullname, address, category, customer_type, price, image, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                RETURNING {CUSTOMER_COLUMNS}"
            ),
            (
                customer.user_id.trim(),
                customer.fullname.trim(),
                customer.address.trim(),
                customer.category.trim(),
                customer.customer_type.trim(),
                customer.price,
                &customer.image,
                now,
            ),
            map_customer_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == SQLITE_CONSTRAINT_PRIMARYKEY
                    || sql_error.extended_code == SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::DuplicateCustomer(customer.user_id.clone())
            }
            error => error.into(),
        })
}

/// Get the customer with the ID `user_id`.
///
/// # Errors
///
/// Returns [Error::CustomerNotFound] if there is no such customer.
#[cfg(test)]
pub fn get_customer(user_id: &str, connection: &Connection) -> Result<Customer, Error> {
    connection
        .query_row(
            &format!("SELECT {CUSTOMER_COLUMNS} FROM customer WHERE user_id = ?1"),
            (user_id,),
            map_customer_row,
        )
        .map_err(not_found_as_customer)
}

/// Whether a customer with the ID `user_id` exists.
pub fn customer_exists(user_id: &str, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS (SELECT 1 FROM customer WHERE user_id = ?1)",
            (user_id,),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Get one page of customers matching `filter`, ordered by user ID, and the
/// total number of matching customers.
pub fn list_customers(
    filter: &CustomerFilter,
    page: Page,
    connection: &Connection,
) -> Result<(Vec<Customer>, u64), Error> {
    let mut predicates = Predicates::new();

    if let Some(customer_type) = &filter.customer_type {
        predicates.equals("customer_type", customer_type.clone());
    }

    if let Some(search) = &filter.search {
        predicates.contains_any(&SEARCH_COLUMNS, search);
    }

    let where_clause = predicates.where_clause();

    let total_records: i64 = connection.query_row(
        &format!("SELECT COUNT(*) FROM customer {where_clause}"),
        params_from_iter(predicates.params().iter()),
        |row| row.get(0),
    )?;

    let limit = predicates.bind(page.size as i64);
    let offset = predicates.bind(page.offset() as i64);
    let query = format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customer {where_clause}
        ORDER BY user_id LIMIT {limit} OFFSET {offset}"
    );

    let customers = connection
        .prepare(&query)?
        .query_map(params_from_iter(predicates.params().iter()), map_customer_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((customers, u64::try_from(total_records).unwrap_or_default()))
}

/// Apply the fields present in `patch` to the customer `user_id`.
///
/// # Errors
///
/// Returns [Error::Validation] for a non-positive price and
/// [Error::CustomerNotFound] if there is no such customer.
pub fn update_customer(
    user_id: &str,
    patch: &CustomerPatch,
    now: Timestamp,
    connection: &Connection,
) -> Result<Customer, Error> {
    if patch.price.is_some_and(|price| price <= 0) {
        return Err(Error::Validation("Price must be a positive number".to_owned()));
    }

    let non_blank = |text: &Option<String>| {
        text.as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_owned)
    };

    connection
        .query_row(
            &format!(
                "UPDATE customer
                SET fullname = COALESCE(?1, fullname),
                    address = COALESCE(?2, address),
                    category = COALESCE(?3, category),
                    customer_type = COALESCE(?4, customer_type),
                    price = COALESCE(?5, price),
                    image = COALESCE(?6, image),
                    updated_at = ?7
                WHERE user_id = ?8
                RETURNING {CUSTOMER_COLUMNS}"
            ),
            (
                non_blank(&patch.fullname),
                non_blank(&patch.address),
                non_blank(&patch.category),
                non_blank(&patch.customer_type),
                patch.price,
                &patch.image,
                now,
                user_id,
            ),
            map_customer_row,
        )
        .map_err(not_found_as_customer)
}

/// Get the stored image of customer `user_id`.
///
/// # Errors
///
/// Returns [Error::CustomerNotFound] if there is no such customer and
/// [Error::ImageNotFound] if they have no image.
pub fn get_customer_image(user_id: &str, connection: &Connection) -> Result<Vec<u8>, Error> {
    connection
        .query_row(
            "SELECT image FROM customer WHERE user_id = ?1",
            (user_id,),
            |row| row.get::<_, Option<Vec<u8>>>(0),
        )
        .optional()?
        .ok_or(Error::CustomerNotFound)?
        .ok_or(Error::ImageNotFound)
}

fn not_found_as_customer(error: rusqlite::Error) -> Error {
    match error {
        rusqlite::Error::QueryReturnedNoRows => Error::CustomerNotFound,
        error => error.into(),
    }
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_customer_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_customer_table(&connection));
    }
}
