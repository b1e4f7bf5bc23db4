//! Analysis routes - Date-sliced data analysis
//!
//! Features:
//! - Load operations within an inclusive date range, grouped under their pensioners
//! - Editable JSON data fed to the analysis flow
//! - Trend identification, data comparison, liability projection
//! - Report in text, JSON or CSV
//!
//! Structure:
//! - api.rs: HTMX endpoints for loading data and running the analysis
//! - page.rs: Full page rendering

pub mod api;
pub mod page;

pub use api::{htmx_analysis_data, htmx_analysis_run, parse_period};
pub use page::page_analysis;
