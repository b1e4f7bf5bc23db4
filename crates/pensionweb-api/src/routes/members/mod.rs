//! Member routes - Affiliés and allocataires
//!
//! Features:
//! - Affilié list with search (matricule, name, id) and active/inactive filter
//! - Allocataire list with search (dossier number, name)
//!
//! Structure:
//! - api.rs: HTMX list partials
//! - page.rs: Full page rendering

pub mod api;
pub mod page;

pub use api::{htmx_affilies_list, htmx_allocataires_list, render_affilies, render_allocataires};
pub use page::{page_affilies, page_allocataires};
