//! The stock ledger: an append-only log of IN and OUT movements, and the
//! transaction that applies a movement to a product's stock.

use std::{
    fmt::Display,
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use rusqlite::{
    Connection, Row, ToSql, Transaction as SqlTransaction, TransactionBehavior,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    customer::customer_exists,
    database_id::{LedgerEntryID, ProductID},
    pagination::PaginationConfig,
    timestamp::Timestamp,
};

const LEDGER_ENTRY_COLUMNS: &str = "id, customer_id, product_id, movement_type, quantity, price, \
     total_price, category, created_at, updated_at";

/// The state shared by the ledger endpoints.
#[derive(Debug, Clone)]
pub struct LedgerState {
    /// The database connection for the ledger and the products it moves.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,
    /// Whether movements must name a registered customer.
    pub customer_policy: CustomerPolicy,
    /// The default and maximum page sizes of the history.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for LedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            customer_policy: state.customer_policy,
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementType {
    /// Stock coming in, e.g. a restock. Recorded as an expense.
    #[serde(rename = "IN")]
    In,
    /// Stock going out, e.g. a sale. Recorded as income.
    #[serde(rename = "OUT")]
    Out,
}

impl MovementType {
    /// The text stored in the database and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
        }
    }
}

impl Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = Error;

    /// Parse exactly "IN" or "OUT".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(MovementType::In),
            "OUT" => Ok(MovementType::Out),
            other => Err(Error::InvalidMovementType(other.to_owned())),
        }
    }
}

impl ToSql for MovementType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MovementType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// Whether recording a movement requires its customer to be registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CustomerPolicy {
    /// The customer ID is stored as given.
    #[default]
    Unchecked,
    /// Movements for unknown customers fail with [Error::CustomerNotFound].
    MustExist,
}

/// A validated request to move stock in or out.
#[derive(Debug, Clone, PartialEq)]
pub struct Movement {
    product_id: ProductID,
    movement_type: MovementType,
    quantity: i64,
    price: i64,
    total_price: i64,
    user_id: String,
    category: String,
    created_at: Option<Timestamp>,
}

impl Movement {
    /// Validate a movement of `quantity` units at `price` each.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] if `user_id` or `category` is blank, if
    /// `quantity` or `price` is not positive, or if the total price overflows.
    pub fn new(
        product_id: ProductID,
        movement_type: MovementType,
        quantity: i64,
        price: i64,
        user_id: &str,
        category: &str,
    ) -> Result<Self, Error> {
        let user_id = user_id.trim();
        let category = category.trim();

        if user_id.is_empty() || category.is_empty() {
            return Err(Error::Validation("All fields are required".to_owned()));
        }

        if quantity <= 0 || price <= 0 {
            return Err(Error::Validation(
                "Quantity and price must be positive numbers".to_owned(),
            ));
        }

        let total_price = quantity
            .checked_mul(price)
            .ok_or_else(|| Error::Validation("Total price is too large".to_owned()))?;

        Ok(Self {
            product_id,
            movement_type,
            quantity,
            price,
            total_price,
            user_id: user_id.to_owned(),
            category: category.to_owned(),
            created_at: None,
        })
    }

    /// Record the movement at `created_at` instead of the current time.
    pub fn created_at(mut self, created_at: Option<Timestamp>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// An immutable row of the stock ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: LedgerEntryID,
    /// The customer the movement was for.
    pub user_id: String,
    pub product_id: ProductID,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i64,
    /// The unit price.
    pub price: i64,
    /// `quantity * price`, fixed when the entry was created.
    pub total_price: i64,
    pub category: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub fn create_ledger_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS ledger_entry (
            id INTEGER PRIMARY KEY,
            customer_id TEXT NOT NULL,
            product_id INTEGER NOT NULL,
            movement_type TEXT NOT NULL CHECK (movement_type IN ('IN', 'OUT')),
            quantity INTEGER NOT NULL CHECK (quantity > 0),
            price INTEGER NOT NULL CHECK (price > 0),
            total_price INTEGER NOT NULL,
            category TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ledger_entry_product_date
            ON ledger_entry(product_id, created_at);

        CREATE TRIGGER IF NOT EXISTS ledger_entry_no_update
        BEFORE UPDATE ON ledger_entry
        BEGIN
            SELECT RAISE(ABORT, 'ledger entries are append-only');
        END;

        CREATE TRIGGER IF NOT EXISTS ledger_entry_no_delete
        BEFORE DELETE ON ledger_entry
        BEGIN
            SELECT RAISE(ABORT, 'ledger entries are append-only');
        END;",
    )?;

    Ok(())
}

pub fn map_ledger_entry_row(row: &Row) -> Result<LedgerEntry, rusqlite::Error> {
    Ok(LedgerEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        product_id: row.get(2)?,
        movement_type: row.get(3)?,
        quantity: row.get(4)?,
        price: row.get(5)?,
        total_price: row.get(6)?,
        category: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// The stock left after moving `requested` units in the direction `movement_type`.
///
/// # Errors
///
/// Returns [Error::InsufficientStock] if an OUT movement asks for more than
/// `current`, or [Error::Validation] if an IN movement would overflow.
pub fn apply_movement(
    current: i64,
    movement_type: MovementType,
    requested: i64,
) -> Result<i64, Error> {
    match movement_type {
        MovementType::In => current
            .checked_add(requested)
            .ok_or_else(|| Error::Validation("Quantity in stock is too large".to_owned())),
        MovementType::Out if current < requested => Err(Error::InsufficientStock {
            available: current,
            requested,
        }),
        MovementType::Out => Ok(current - requested),
    }
}

/// Apply `movement` to its product's stock and append it to the ledger.
///
/// The product read, the stock update and the ledger insert run in one
/// IMMEDIATE transaction, so the write lock is held from the read onwards and
/// concurrent movements on other connections wait for it. On any error
/// nothing is written.
///
/// `now` stamps the product update, and the entry too unless the movement
/// carries its own time.
///
/// # Errors
///
/// Returns:
/// - [Error::CustomerNotFound] if `policy` is [CustomerPolicy::MustExist] and
///   the customer is not registered,
/// - [Error::ProductNotFound] if the product does not exist,
/// - [Error::InsufficientStock] if an OUT movement exceeds the stock,
/// - [Error::SqlError] if the database could not be read or written.
pub fn record_movement(
    movement: Movement,
    policy: CustomerPolicy,
    now: Timestamp,
    connection: &Connection,
) -> Result<LedgerEntry, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    if policy == CustomerPolicy::MustExist && !customer_exists(&movement.user_id, &transaction)? {
        return Err(Error::CustomerNotFound);
    }

    let current: i64 = transaction
        .query_row(
            "SELECT quantity FROM product WHERE id = ?1",
            (movement.product_id,),
            |row| row.get(0),
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::ProductNotFound,
            error => error.into(),
        })?;

    let new_quantity = apply_movement(current, movement.movement_type, movement.quantity)?;

    transaction.execute(
        "UPDATE product SET quantity = ?1, updated_at = ?2 WHERE id = ?3",
        (new_quantity, now, movement.product_id),
    )?;

    let created_at = movement.created_at.unwrap_or(now);
    let entry = transaction.query_row(
        &format!(
            "INSERT INTO ledger_entry
                (customer_id, product_id, movement_type, quantity, price, total_price, category, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            RETURNING {LEDGER_ENTRY_COLUMNS}"
        ),
        (
            &movement.user_id,
            movement.product_id,
            movement.movement_type,
            movement.quantity,
            movement.price,
            movement.total_price,
            &movement.category,
            created_at,
        ),
        map_ledger_entry_row,
    )?;

    transaction.commit()?;

    tracing::debug!(
        "product {} moved {} {} to quantity {new_quantity}",
        entry.product_id,
        entry.movement_type,
        entry.quantity
    );

    Ok(entry)
}

#[cfg(test)]
pub(crate) fn count_ledger_entries(connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row("SELECT COUNT(*) FROM ledger_entry", [], |row| row.get(0))
        .map_err(Error::from)
}

#[cfg(test)]
mod movement_tests {
    use crate::Error;

    use super::{Movement, MovementType, apply_movement};

    #[test]
    fn movement_type_parses_exact_text() {
        assert_eq!("IN".parse(), Ok(MovementType::In));
        assert_eq!("OUT".parse(), Ok(MovementType::Out));
        assert_eq!(
            "out".parse::<MovementType>(),
            Err(Error::InvalidMovementType("out".to_owned()))
        );
    }

    #[test]
    fn movement_requires_positive_numbers() {
        assert_eq!(
            Movement::new(1, MovementType::In, 0, 10, "C-1", "retail"),
            Err(Error::Validation(
                "Quantity and price must be positive numbers".to_owned()
            ))
        );
        assert!(Movement::new(1, MovementType::In, 1, -10, "C-1", "retail").is_err());
    }

    #[test]
    fn movement_requires_customer_and_category() {
        assert_eq!(
            Movement::new(1, MovementType::In, 1, 10, " ", "retail"),
            Err(Error::Validation("All fields are required".to_owned()))
        );
        assert!(Movement::new(1, MovementType::In, 1, 10, "C-1", "").is_err());
    }

    #[test]
    fn overflowing_total_price_is_rejected() {
        assert!(matches!(
            Movement::new(1, MovementType::In, i64::MAX, 2, "C-1", "retail"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn out_of_exactly_the_stock_empties_it() {
        assert_eq!(apply_movement(5, MovementType::Out, 5), Ok(0));
    }

    #[test]
    fn out_of_more_than_the_stock_fails() {
        assert_eq!(
            apply_movement(4, MovementType::Out, 5),
            Err(Error::InsufficientStock {
                available: 4,
                requested: 5
            })
        );
    }

    #[test]
    fn in_overflow_fails() {
        assert!(matches!(
            apply_movement(i64::MAX, MovementType::In, 1),
            Err(Error::Validation(_))
        ));
    }
}

#[cfg(test)]
mod record_movement_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        customer::{NewCustomer, create_customer},
        initialize_db,
        product::{NewProduct, Product, create_product, get_product},
        timestamp::Timestamp,
    };

    use super::{
        CustomerPolicy, Movement, MovementType, count_ledger_entries, record_movement,
    };

    fn now() -> Timestamp {
        Timestamp::new(datetime!(2024-05-01 09:00:00))
    }

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize_db(&conn).unwrap();
        conn
    }

    #[track_caller]
    fn must_create_product(quantity: i64, conn: &Connection) -> Product {
        create_product(
            NewProduct::new("Gula", quantity, 1000, None).unwrap(),
            now(),
            conn,
        )
        .expect("could not create test product")
    }

    fn movement(product: &Product, movement_type: MovementType, quantity: i64) -> Movement {
        Movement::new(product.id, movement_type, quantity, 1500, "C-1", "retail").unwrap()
    }

    #[test]
    fn quantity_is_initial_plus_in_minus_out() {
        let conn = get_test_connection();
        let product = must_create_product(10, &conn);

        for (movement_type, quantity) in [
            (MovementType::In, 5),
            (MovementType::Out, 3),
            (MovementType::Out, 12),
            (MovementType::In, 1),
        ] {
            record_movement(
                movement(&product, movement_type, quantity),
                CustomerPolicy::Unchecked,
                now(),
                &conn,
            )
            .unwrap();
        }

        assert_eq!(get_product(product.id, &conn).unwrap().quantity, 10 + 5 - 3 - 12 + 1);
        assert_eq!(count_ledger_entries(&conn), Ok(4));
    }

    #[test]
    fn entry_stores_total_price() {
        let conn = get_test_connection();
        let product = must_create_product(10, &conn);

        let entry = record_movement(
            movement(&product, MovementType::Out, 4),
            CustomerPolicy::Unchecked,
            now(),
            &conn,
        )
        .unwrap();

        assert_eq!(entry.total_price, 4 * 1500);
        assert_eq!(entry.movement_type, MovementType::Out);
        assert_eq!(entry.user_id, "C-1");
        assert_eq!(entry.created_at, now());
        assert_eq!(entry.updated_at, now());
    }

    #[test]
    fn total_price_is_quantity_times_price() {
        let conn = get_test_connection();

        for (quantity, price) in [
            (1, 1),
            (3, 7),
            (4, 1500),
            (250, 12_000),
            (i64::MAX / 2, 2),
            (1, i64::MAX),
            (3_037_000_499, 3_037_000_499),
        ] {
            let product = must_create_product(0, &conn);
            let movement =
                Movement::new(product.id, MovementType::In, quantity, price, "C-1", "restock")
                    .unwrap();

            let entry =
                record_movement(movement, CustomerPolicy::Unchecked, now(), &conn).unwrap();

            assert_eq!(entry.quantity, quantity);
            assert_eq!(entry.price, price);
            assert_eq!(entry.total_price, quantity * price, "{quantity} x {price}");
        }
    }

    #[test]
    fn rejected_out_changes_nothing() {
        let conn = get_test_connection();
        let product = must_create_product(2, &conn);

        let result = record_movement(
            movement(&product, MovementType::Out, 3),
            CustomerPolicy::Unchecked,
            now(),
            &conn,
        );

        assert_eq!(
            result,
            Err(Error::InsufficientStock {
                available: 2,
                requested: 3
            })
        );
        assert_eq!(get_product(product.id, &conn).unwrap(), product);
        assert_eq!(count_ledger_entries(&conn), Ok(0));
    }

    #[test]
    fn missing_product_fails() {
        let conn = get_test_connection();
        let movement = Movement::new(42, MovementType::In, 1, 1, "C-1", "retail").unwrap();

        let result = record_movement(movement, CustomerPolicy::Unchecked, now(), &conn);

        assert_eq!(result, Err(Error::ProductNotFound));
        assert_eq!(count_ledger_entries(&conn), Ok(0));
    }

    #[test]
    fn must_exist_policy_rejects_unknown_customer() {
        let conn = get_test_connection();
        let product = must_create_product(10, &conn);

        let result = record_movement(
            movement(&product, MovementType::In, 1),
            CustomerPolicy::MustExist,
            now(),
            &conn,
        );

        assert_eq!(result, Err(Error::CustomerNotFound));
        assert_eq!(get_product(product.id, &conn).unwrap().quantity, 10);
    }

    #[test]
    fn must_exist_policy_accepts_registered_customer() {
        let conn = get_test_connection();
        let product = must_create_product(10, &conn);
        create_customer(
            NewCustomer {
                user_id: "C-1".to_owned(),
                fullname: "Siti".to_owned(),
                address: "Jl. Merdeka 1".to_owned(),
                category: "retail".to_owned(),
                customer_type: "agent".to_owned(),
                price: 1500,
                image: None,
            },
            now(),
            &conn,
        )
        .unwrap();

        let result = record_movement(
            movement(&product, MovementType::In, 1),
            CustomerPolicy::MustExist,
            now(),
            &conn,
        );

        assert!(result.is_ok());
    }

    #[test]
    fn explicit_created_at_is_kept() {
        let conn = get_test_connection();
        let product = must_create_product(10, &conn);
        let back_dated = Timestamp::new(datetime!(2024-03-15 08:00:00));

        let entry = record_movement(
            movement(&product, MovementType::In, 1).created_at(Some(back_dated)),
            CustomerPolicy::Unchecked,
            now(),
            &conn,
        )
        .unwrap();

        assert_eq!(entry.created_at, back_dated);
        assert_eq!(entry.updated_at, back_dated);
        assert_eq!(get_product(product.id, &conn).unwrap().updated_at, now());
    }

    #[test]
    fn entries_cannot_be_changed_or_removed() {
        let conn = get_test_connection();
        let product = must_create_product(10, &conn);
        record_movement(
            movement(&product, MovementType::In, 1),
            CustomerPolicy::Unchecked,
            now(),
            &conn,
        )
        .unwrap();

        assert!(conn.execute("UPDATE ledger_entry SET quantity = 99", []).is_err());
        assert!(conn.execute("DELETE FROM ledger_entry", []).is_err());
        assert_eq!(count_ledger_entries(&conn), Ok(1));
    }

    #[test]
    fn deleting_product_keeps_entries() {
        let conn = get_test_connection();
        let product = must_create_product(10, &conn);
        record_movement(
            movement(&product, MovementType::Out, 1),
            CustomerPolicy::Unchecked,
            now(),
            &conn,
        )
        .unwrap();

        conn.execute("DELETE FROM product WHERE id = ?1", (product.id,))
            .unwrap();

        assert_eq!(count_ledger_entries(&conn), Ok(1));
    }
}
