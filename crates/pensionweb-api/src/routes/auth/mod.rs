//! Auth routes - Sign-in, sign-out and session inspection
//!
//! Features:
//! - Login form checked against the configured allow-list
//! - Session cookie issued on success, cleared on logout
//! - Debug page listing the current session's stored keys
//!
//! Structure:
//! - api.rs: Login/logout handlers and the session JSON endpoint
//! - page.rs: Login and debug pages

pub mod api;
pub mod page;

pub use api::{api_session, htmx_login, logout};
pub use page::{page_debug, page_login};
