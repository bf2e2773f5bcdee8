//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::Response,
    routing::{get, post, put},
};

use crate::{
    AppState,
    auth::{auth_guard, log_in, register_user},
    customer::{
        create_customer_endpoint, edit_customer_endpoint, get_customer_image_endpoint,
        list_customers_endpoint,
    },
    endpoints,
    ledger::{
        create_movement_endpoint, distinct_dates_endpoint, history_endpoint,
        last_30_days_endpoint, total_expenses_endpoint,
    },
    product::{
        count_product_endpoint, create_product_endpoint, delete_product_endpoint,
        edit_product_endpoint, get_product_image_endpoint, list_products_endpoint,
        update_stock_endpoint,
    },
    response,
};

/// The largest request body accepted, which bounds image uploads.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_root))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(log_in));

    let protected_routes = Router::new()
        .route(
            endpoints::CUSTOMERS,
            get(list_customers_endpoint)
                .post(create_customer_endpoint)
                .put(edit_customer_endpoint),
        )
        .route(endpoints::CUSTOMER_IMAGE, get(get_customer_image_endpoint))
        .route(endpoints::PRODUCTS, get(list_products_endpoint))
        .route(endpoints::NEW_PRODUCT, post(create_product_endpoint))
        .route(
            endpoints::PRODUCT,
            put(edit_product_endpoint).delete(delete_product_endpoint),
        )
        .route(endpoints::PRODUCT_IMAGE, get(get_product_image_endpoint))
        .route(endpoints::PRODUCT_COUNT, get(count_product_endpoint))
        .route(endpoints::PRODUCT_STOCK, put(update_stock_endpoint))
        .route(endpoints::TRANSACTIONS, get(history_endpoint))
        .route(endpoints::NEW_TRANSACTION, post(create_movement_endpoint))
        .route(endpoints::LAST_30_DAYS, get(last_30_days_endpoint))
        .route(endpoints::TOTAL_EXPENSES, get(total_expenses_endpoint))
        .route(endpoints::DISTINCT_DATES, get(distinct_dates_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Report that the API is up.
async fn get_root() -> Response {
    response::message(StatusCode::OK, "API run successfully!")
}

async fn get_404_not_found() -> Response {
    response::message(StatusCode::NOT_FOUND, "Not found")
}
