//! peerview-services — the peer directory, pairing, view computation and
//! the signaling relay built on top of peerview-core.

pub mod directory;
pub mod pairing;
pub mod relay;
pub mod view;

pub use directory::{Claim, PeerDirectory, Registry};
pub use pairing::PairingAssigner;
pub use relay::{Delivery, Envelope, RelayError, SignalRelay};
pub use view::{PeerView, ViewError};
