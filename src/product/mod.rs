mod core;
mod count_endpoint;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod image_endpoint;
mod list_endpoint;
mod stock_endpoint;

pub use core::{create_product_table, get_product};
#[cfg(test)]
pub use core::{NewProduct, Product, create_product};
pub use count_endpoint::count_product_endpoint;
pub use create_endpoint::create_product_endpoint;
pub use delete_endpoint::delete_product_endpoint;
pub use edit_endpoint::edit_product_endpoint;
pub use image_endpoint::get_product_image_endpoint;
pub use list_endpoint::list_products_endpoint;
pub use stock_endpoint::update_stock_endpoint;
