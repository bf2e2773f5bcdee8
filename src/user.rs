//! Code for creating the user table and fetching user accounts from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row, ffi::SQLITE_CONSTRAINT_UNIQUE};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This is the ID of a login account, not the externally supplied
/// identifier of a customer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A login account of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The unique name used to log in.
    pub username: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The role embedded in the user's tokens, e.g. "admin".
    pub role: String,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                role TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::DuplicateUsername] if `username` is already taken,
/// - [Error::SqlError] if another SQL related error occurred.
pub fn create_user(
    username: &str,
    password_hash: PasswordHash,
    role: &str,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .query_row(
            "INSERT INTO user (username, password, role) VALUES (?1, ?2, ?3)
            RETURNING id, username, password, role",
            (username, password_hash.as_ref(), role),
            map_user_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::DuplicateUsername(username.to_owned())
            }
            error => error.into(),
        })
}

/// Get the user from the database with the username `username`.
///
/// # Errors
///
/// This function will return an error if:
/// - `username` does not belong to a registered user ([Error::UserNotFound]),
/// - there was an error trying to access the store.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, password, role FROM user WHERE username = :username")?
        .query_row(&[(":username", &username)], map_user_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UserNotFound,
            error => error.into(),
        })
}

/// Replace the password of the user with the given ID.
///
/// # Errors
///
/// Returns [Error::UserNotFound] if no user has the ID `user_id`.
pub fn set_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UserNotFound);
    }

    Ok(())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: row.get(1)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        role: row.get(3)?,
    })
}
