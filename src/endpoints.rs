//! The API endpoint URIs.
//!
//! Parameters are written in axum's path syntax, e.g., '/api/products/{product_id}'.

#[cfg(test)]
use std::fmt::Display;

/// The unauthenticated liveness route.
pub const ROOT: &str = "/";

/// The route for creating a login account.
pub const REGISTER: &str = "/api/auth/register";
/// The route for exchanging credentials for a bearer token.
pub const LOG_IN: &str = "/api/auth/login";

/// The route for listing, registering and updating customers.
///
/// The misspelling is part of the published API.
pub const CUSTOMERS: &str = "/api/costumers";
/// The route for a customer's image.
pub const CUSTOMER_IMAGE: &str = "/api/costumers/{user_id}/image";

/// The route for listing products.
pub const PRODUCTS: &str = "/api/products";
/// The route for adding a product.
pub const NEW_PRODUCT: &str = "/api/products/new";
/// The route for editing or deleting a product.
pub const PRODUCT: &str = "/api/products/{product_id}";
/// The route for a product's image.
pub const PRODUCT_IMAGE: &str = "/api/products/{product_id}/image";
/// The route for a product's stock and recent sales.
pub const PRODUCT_COUNT: &str = "/api/products/count/{product_id}";
/// The route for overwriting a product's stock.
pub const PRODUCT_STOCK: &str = "/api/products/stock/{product_id}";

/// The route for the paginated ledger history.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for recording a stock movement.
pub const NEW_TRANSACTION: &str = "/api/transactions/new";
/// The route for one product's daily quantities over the last 30 days.
pub const LAST_30_DAYS: &str = "/api/transactions/last30days/{product_id}";
/// The route for this month's income and expenses.
pub const TOTAL_EXPENSES: &str = "/api/transactions/totalExpenses";
/// The route for the dates with any ledger activity.
pub const DISTINCT_DATES: &str = "/api/transactions/distinctDate";

/// Replace the parameter in `endpoint_path` with `param`.
///
/// This function assumes that an endpoint path contains a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, param: impl Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        param,
        &endpoint_path[param_end..]
    )
}
