//! Route modules for the portal server
//!
//! All routes are organized into modules for better maintainability:
//! - dashboard: Stats cards, monthly payments, recent activity
//! - pensioners: Pensioner list, create form, detail, record summary
//! - groups: Company groups
//! - members: Affiliés and allocataires
//! - refunds: Deduction operations
//! - statistics: Aggregates over pensioners and operations
//! - analysis: Date-sliced data analysis
//! - chat: Pension data assistant
//! - auth: Login, logout, session debug
//! - settings: Settings page
//!
//! Each module follows a consistent structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API endpoints and HTMX partials
//! - page.rs: HTMX page rendering

pub mod analysis;
pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod groups;
pub mod members;
pub mod pensioners;
pub mod refunds;
pub mod settings;
pub mod statistics;
