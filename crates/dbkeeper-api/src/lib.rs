//! dbkeeper API Library
//!
//! Version: 0.3.0
//!
//! Web frontend: an HTML page with backup and restore forms, the form
//! handlers, and a JSON view of the audit log.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
