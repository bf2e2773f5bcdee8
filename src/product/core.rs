//! The product table and the queries that read and write it.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};
use serde::Serialize;

use crate::{
    AppState, Error, ImageConfig, database_id::ProductID, query_filter::Predicates,
    timestamp::Timestamp,
};

/// The columns selected for a [Product], in the order [map_product_row] expects.
const PRODUCT_COLUMNS: &str =
    "id, name, quantity, price, image IS NOT NULL, created_at, updated_at";

/// The state shared by the product endpoints.
#[derive(Debug, Clone)]
pub struct ProductState {
    /// The database connection for managing products.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,
    /// How uploaded images are shrunk before they are stored.
    pub image_config: ImageConfig,
}

impl FromRef<AppState> for ProductState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            image_config: state.image_config.clone(),
        }
    }
}

/// An item in the catalog and how many of it are in stock.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// The ID of the product.
    pub id: ProductID,
    /// The display name.
    pub name: String,
    /// The number of units in stock, never negative.
    pub quantity: i64,
    /// The unit price, always positive.
    pub price: i64,
    /// Whether an image is attached. The bytes are served separately.
    pub has_image: bool,
    /// When the product was created.
    pub created_at: Timestamp,
    /// When the product was last changed.
    pub updated_at: Timestamp,
}

/// The data needed to add a product to the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    name: String,
    quantity: i64,
    price: i64,
    image: Option<Vec<u8>>,
}

impl NewProduct {
    /// Validate the fields of a new product.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] if `name` is blank, `quantity` is negative
    /// or `price` is not positive.
    pub fn new(
        name: &str,
        quantity: i64,
        price: i64,
        image: Option<Vec<u8>>,
    ) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::Validation("Product name must not be empty".to_owned()));
        }

        if quantity < 0 {
            return Err(Error::Validation("Quantity must not be negative".to_owned()));
        }

        if price <= 0 {
            return Err(Error::Validation("Price must be a positive number".to_owned()));
        }

        Ok(Self {
            name: name.to_owned(),
            quantity,
            price,
            image,
        })
    }
}

/// The fields of a product that may be edited directly.
///
/// Stock is absent: it changes through the ledger or
/// [set_stock].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    /// A new display name.
    pub name: Option<String>,
    /// A new unit price.
    pub price: Option<i64>,
}

pub fn create_product_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS product (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity >= 0),
            price INTEGER NOT NULL CHECK (price > 0),
            image BLOB,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub fn map_product_row(row: &Row) -> Result<Product, rusqlite::Error> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        quantity: row.get(2)?,
        price: row.get(3)?,
        has_image: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Insert a product stamped with `now`.
///
/// # Errors
///
/// Returns [Error::SqlError] if the insert failed.
pub fn create_product(
    product: NewProduct,
    now: Timestamp,
    connection: &Connection,
) -> Result<Product, Error> {
    connection
        .query_row(
            &format!(
                "INSERT INTO product (name, quantity, price, image, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                RETURNING {PRODUCT_COLUMNS}"
            ),
            (
                &product.name,
                product.quantity,
                product.price,
                &product.image,
                now,
            ),
            map_product_row,
        )
        .map_err(Error::from)
}

/// Get the product with the ID `id`.
///
/// # Errors
///
/// Returns [Error::ProductNotFound] if there is no such product.
pub fn get_product(id: ProductID, connection: &Connection) -> Result<Product, Error> {
    connection
        .query_row(
            &format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?1"),
            (id,),
            map_product_row,
        )
        .map_err(not_found_as_product)
}

/// Get all products, or only those named exactly `name`, ordered by ID.
pub fn list_products(name: Option<&str>, connection: &Connection) -> Result<Vec<Product>, Error> {
    let mut predicates = Predicates::new();
    if let Some(name) = name {
        predicates.equals("name", name.to_owned());
    }

    let query = format!(
        "SELECT {PRODUCT_COLUMNS} FROM product {} ORDER BY id",
        predicates.where_clause()
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(predicates.params().iter()), map_product_row)?
        .map(|maybe_product| maybe_product.map_err(Error::from))
        .collect()
}

/// Apply the fields present in `patch` to the product `id`.
///
/// # Errors
///
/// Returns [Error::Validation] for a blank name or non-positive price, and
/// [Error::ProductNotFound] if there is no such product.
pub fn update_product(
    id: ProductID,
    patch: &ProductPatch,
    now: Timestamp,
    connection: &Connection,
) -> Result<Product, Error> {
    let name = patch.name.as_deref().map(str::trim);

    if name.is_some_and(str::is_empty) {
        return Err(Error::Validation("Product name must not be empty".to_owned()));
    }

    if patch.price.is_some_and(|price| price <= 0) {
        return Err(Error::Validation("Price must be a positive number".to_owned()));
    }

    connection
        .query_row(
            &format!(
                "UPDATE product
                SET name = COALESCE(?1, name),
                    price = COALESCE(?2, price),
                    updated_at = ?3
                WHERE id = ?4
                RETURNING {PRODUCT_COLUMNS}"
            ),
            (name, patch.price, now, id),
            map_product_row,
        )
        .map_err(not_found_as_product)
}

/// Delete the product `id`. Its ledger entries are kept.
///
/// # Errors
///
/// Returns [Error::ProductNotFound] if there is no such product.
pub fn delete_product(id: ProductID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM product WHERE id = ?1", (id,))?;

    if rows_affected == 0 {
        return Err(Error::ProductNotFound);
    }

    Ok(())
}

/// Overwrite the stock of product `id` without writing a ledger entry.
///
/// This is an administrative correction: afterwards the stock no longer
/// equals the sum of the product's ledger entries.
///
/// # Errors
///
/// Returns [Error::Validation] for a negative quantity, and
/// [Error::ProductNotFound] if there is no such product.
pub fn set_stock(
    id: ProductID,
    quantity: i64,
    now: Timestamp,
    connection: &Connection,
) -> Result<Product, Error> {
    if quantity < 0 {
        return Err(Error::Validation("Quantity must not be negative".to_owned()));
    }

    let product = connection
        .query_row(
            &format!(
                "UPDATE product SET quantity = ?1, updated_at = ?2 WHERE id = ?3
                RETURNING {PRODUCT_COLUMNS}"
            ),
            (quantity, now, id),
            map_product_row,
        )
        .map_err(not_found_as_product)?;

    tracing::warn!("stock of product {id} overwritten to {quantity}, bypassing the ledger");

    Ok(product)
}

/// Get the stored image of product `id`.
///
/// # Errors
///
/// Returns [Error::ProductNotFound] if there is no such product and
/// [Error::ImageNotFound] if it has no image.
pub fn get_product_image(id: ProductID, connection: &Connection) -> Result<Vec<u8>, Error> {
    connection
        .query_row("SELECT image FROM product WHERE id = ?1", (id,), |row| {
            row.get::<_, Option<Vec<u8>>>(0)
        })
        .optional()?
        .ok_or(Error::ProductNotFound)?
        .ok_or(Error::ImageNotFound)
}

fn not_found_as_product(error: rusqlite::Error) -> Error {
    match error {
        rusqlite::Error::QueryReturnedNoRows => Error::ProductNotFound,
        error => error.into(),
    }
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_product_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_product_table(&connection));
    }
}
