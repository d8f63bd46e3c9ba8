//! Core domain types and shared logic for the Gantry sync pipeline.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Tenant-scoped album, manifest, video and object entities
//! - Queue payloads and HTTP request bodies (the wire format)
//! - The clock abstraction used for scheduled delivery and audit fields
//! - Content checksums
//! - Configuration for the cloud and agent binaries

pub mod checksum;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod messages;

pub use checksum::Checksum;
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::{Album, AlbumVideo, StoredObject, Video};
pub use error::{Error, Result};

/// Default number of in-handler attempts for outbound cloud calls.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for in-handler retry backoff: 8 * 2^attempt seconds.
pub const RETRY_BACKOFF_BASE: std::time::Duration = std::time::Duration::from_secs(8);

/// Maximum repair cycles before the reconciliation loop abandons an album.
pub const MAX_REPAIR_ATTEMPTS: u32 = 3;

/// Base delay for the reconciliation loop's exponential backoff.
pub const REPAIR_BACKOFF_BASE: time::Duration = time::Duration::SECOND;
