#![allow(missing_docs)]

//! Shared fixtures for endpoint tests.

use axum_test::TestServer;
use rusqlite::Connection;

use crate::{
    AppState, PasswordHash, build_router,
    auth::encode_token,
    customer::{NewCustomer, create_customer},
    product::{NewProduct, Product, create_product},
    timestamp::Timestamp,
    timezone::local_now,
    user::{create_user, get_user_by_username},
};

const TEST_USERNAME: &str = "admin";

/// An app state backed by an in-memory database with a cheap bcrypt cost.
pub(crate) fn get_test_state() -> AppState {
    let conn = Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(conn, "42", "Etc/UTC")
        .expect("Could not create app state.")
        .with_password_cost(4)
}

pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

/// A valid bearer token for the test account, creating the account if needed.
#[track_caller]
pub(crate) fn bearer_token(state: &AppState) -> String {
    let connection = state.db_connection.lock().unwrap();
    let user = match get_user_by_username(TEST_USERNAME, &connection) {
        Ok(user) => user,
        Err(_) => create_user(
            TEST_USERNAME,
            PasswordHash::new_unchecked("hunter2"),
            "admin",
            &connection,
        )
        .expect("Could not create test user."),
    };

    encode_token(
        &user,
        time::OffsetDateTime::now_utc(),
        state.token_duration,
        &state.jwt_keys,
    )
    .expect("Could not create test token.")
}

fn now(state: &AppState) -> Timestamp {
    Timestamp::from(local_now(&state.local_timezone).expect("Could not get local time."))
}

#[track_caller]
pub(crate) fn insert_product(state: &AppState, name: &str, quantity: i64, price: i64) -> Product {
    let connection = state.db_connection.lock().unwrap();
    let product = NewProduct::new(name, quantity, price, None).expect("Invalid test product.");

    create_product(product, now(state), &connection).expect("Could not create test product.")
}

/// Register a customer named "Siti" living at "Jl. Merdeka 1".
#[track_caller]
pub(crate) fn insert_customer(state: &AppState, user_id: &str, customer_type: &str) {
    let connection = state.db_connection.lock().unwrap();
    let customer = NewCustomer {
        user_id: user_id.to_owned(),
        fullname: "Siti".to_owned(),
        address: "Jl. Merdeka 1".to_owned(),
        category: "retail".to_owned(),
        customer_type: customer_type.to_owned(),
        price: 12000,
        image: None,
    };

    create_customer(customer, now(state), &connection).expect("Could not create test customer.");
}
