//! peerview-core — peer records, roles, the view line protocol and config.
//! All other peerview crates depend on this one.

pub mod config;
pub mod peer;
pub mod role;

pub use config::{PairingConfig, PeerviewConfig};
pub use peer::{PeerId, PeerRecord};
pub use role::Role;
