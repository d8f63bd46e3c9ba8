//! On-prem agent.
//!
//! The agent side of the pipeline: queue consumers that list albums,
//! snapshot manifests and trigger vault transfers; the receiver endpoint
//! the vault pushes payloads to; and the HTTP client the agent uses to
//! talk to the cloud catalogue.

pub mod client;
pub mod consumers;
pub mod receiver;
pub(crate) mod retry;
pub mod sender;
pub mod vault;

pub use client::{ClientError, CloudClient, HttpCloudClient};
pub use receiver::{ReceiverState, create_receiver_router};
pub use sender::{HttpVideoSender, SenderError, VideoSender};
pub use vault::{FileVaultRegistry, MediaVault, VaultError, VaultRegistry, VaultResult};
