//! The stock ledger, its reports and the endpoints that expose them.

mod core;
mod create_endpoint;
mod history;
mod history_endpoint;
mod report;
mod report_endpoints;

pub use core::{CustomerPolicy, MovementType, create_ledger_table};
#[cfg(test)]
pub use core::{Movement, record_movement};
pub use create_endpoint::create_movement_endpoint;
pub use history_endpoint::history_endpoint;
pub use report::sum_out_quantity;
pub use report_endpoints::{
    distinct_dates_endpoint, last_30_days_endpoint, total_expenses_endpoint,
};
