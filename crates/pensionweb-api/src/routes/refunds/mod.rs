//! Refund routes - Deduction operations
//!
//! Features:
//! - Deductions joined with their pensioner, newest first
//! - Search by operation id, description or pensioner name
//! - Total refunded amount
//!
//! Structure:
//! - api.rs: HTMX list partial
//! - page.rs: Full page rendering

pub mod api;
pub mod page;

pub use api::{htmx_refunds_list, render_refunds};
pub use page::page_refunds;
