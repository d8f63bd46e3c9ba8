//! Repository trait definitions.
//!
//! Each repository owns one idempotent persistence primitive; the stage
//! services depend only on these contracts, never on a concrete backend.

pub mod album_videos;
pub mod albums;
pub mod objects;
pub mod videos;

pub use album_videos::AlbumVideoRepo;
pub use albums::AlbumRepo;
pub use objects::ObjectRepo;
pub use videos::VideoRepo;
