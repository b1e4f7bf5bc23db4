//! Statistics routes - Aggregates over pensioners and operations
//!
//! Features:
//! - Totals (pensioners, operations)
//! - Pensioners by city and by payment method
//! - Sum and average of monthly payments
//! - Pension data assistant
//!
//! Structure:
//! - api.rs: HTMX summary partial
//! - page.rs: Full page rendering

pub mod api;
pub mod page;

pub use api::{htmx_statistics, render_statistics};
pub use page::page_statistics;
