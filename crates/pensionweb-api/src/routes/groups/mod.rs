//! Group routes - Company groups
//!
//! Features:
//! - Company group cards with sector, city, member count and contribution
//! - Search by company name
//! - Sector filter built from the fetched groups
//!
//! Structure:
//! - api.rs: HTMX list partial
//! - page.rs: Full page rendering

pub mod api;
pub mod page;

pub use api::{htmx_groups_list, render_group_cards};
pub use page::page_groups;
