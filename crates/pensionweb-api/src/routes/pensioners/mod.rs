//! Pensioner routes - List, create form, detail and record summary
//!
//! Features:
//! - Pensioner list with search (name, id, phone), city and payment method filters
//! - Create form with required-field checks
//! - Detail page: profile, banking info, operations with net total, demandes
//! - Record summary generated by the assistant
//!
//! Structure:
//! - api.rs: HTMX partials and form endpoints
//! - page.rs: Full page rendering

pub mod api;
pub mod page;

pub use api::{
    htmx_pensioner_detail,
    htmx_pensioner_store,
    htmx_pensioner_summary,
    htmx_pensioners_list,
    REQUIRED_FIELDS_MESSAGE,
};
pub use page::{page_pensioner_create, page_pensioner_detail, page_pensioners};
