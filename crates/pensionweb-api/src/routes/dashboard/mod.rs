//! Dashboard routes - Landing page of the portal
//!
//! Features:
//! - Headline figures (pensioners, operations, cities, payment methods)
//! - Monthly payments chart
//! - Recent activity (five newest operations)
//! - Pension data assistant
//! - Demonstration data badge whenever a widget is served from the fallback dataset
//!
//! Structure:
//! - api.rs: JSON API and HTMX partials for each widget
//! - page.rs: Full page rendering

pub mod api;
pub mod page;

pub use api::{
    api_dashboard_stats,
    htmx_dashboard_payments,
    htmx_dashboard_recent,
    htmx_dashboard_stats,
};
pub use page::page_dashboard;
