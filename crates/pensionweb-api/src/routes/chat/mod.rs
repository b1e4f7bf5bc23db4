//! Chat routes - Pension data assistant
//!
//! Features:
//! - Conversation grounded in a JSON slice of the pensioner list
//! - Greeting and suggested questions
//! - History kept in the form and refreshed out-of-band after each turn
//!
//! Structure:
//! - api.rs: HTMX endpoint answering one turn
//! - page.rs: Chat window embedded in other pages

pub mod api;
pub mod page;

pub use api::htmx_chat;
pub use page::{chat_window, render_turn};
