//! Pension portal core: backend client, view state, fallback data, sessions and flows

pub mod client;
pub mod diagnostics;
pub mod error;
pub mod flows;
pub mod mock;
pub mod models;
pub mod portal;
pub mod session;
pub mod source;
pub mod stats;
pub mod validate;
pub mod view;

pub use client::{BackendClient, Resource};
pub use error::{ApiError, ApiErrorKind, ApiResult, CoreError, ErrorSeverity};
pub use mock::FallbackDataset;
pub use portal::{PensionerDetail, PortalData};
pub use session::{AuthSession, Credentials, LoginResult, SessionRegistry, UserRecord};
pub use source::{DataSource, FallbackPolicy, Sourced};
pub use view::{FilterKey, ListFilter, Searchable, ViewError, ViewState};
