//! API layer for the Submissions domain
//!
//! Contains HTTP handlers, routes, and domain state definition.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::{SubmissionsSettings, SubmissionsState};
pub use routes::routes;
