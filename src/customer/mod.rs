mod core;
mod create_endpoint;
mod edit_endpoint;
mod image_endpoint;
mod list_endpoint;

pub use core::{create_customer_table, customer_exists};
#[cfg(test)]
pub use core::{NewCustomer, create_customer};
pub use create_endpoint::create_customer_endpoint;
pub use edit_endpoint::edit_customer_endpoint;
pub use image_endpoint::get_customer_image_endpoint;
pub use list_endpoint::list_customers_endpoint;
