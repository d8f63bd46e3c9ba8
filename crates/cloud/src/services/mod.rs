//! Cloud-side stage services.
//!
//! Each service owns one idempotent state transition of the pipeline. The
//! HTTP handlers and queue consumers are thin shells around these.

pub mod admission;
pub mod manifest;
pub mod reconcile;
pub mod user_albums;

pub use admission::{AdmissionError, VideoAdmissionService};
pub use manifest::{ManifestError, ManifestUploadService};
pub use reconcile::{ConsistencyCheckConsumer, EventualConsistencyWorker};
pub use user_albums::{UserAlbumsConsumer, UserAlbumsError, UserAlbumsService};
