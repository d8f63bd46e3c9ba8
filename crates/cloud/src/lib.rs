//! Cloud catalogue service.
//!
//! Hosts the HTTP API the on-prem agent talks to, the cloud-side stage
//! services (user-albums fan-out, manifest upload, video admission), and
//! the reconciliation loop that drives unsynced albums back to
//! convergence.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
