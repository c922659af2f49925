//! Peer roles, derived from the name a peer signs in with.

use serde::{Deserialize, Serialize};

/// Role a peer plays in the directory.
///
/// Servers see clients, clients see servers, everyone else sees everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Server,
    Client,
    Unspecified,
}

impl Role {
    /// Classify a peer name. Case-insensitive substring match; `server`
    /// wins over `client` when a name contains both.
    pub fn classify(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("server") {
            Role::Server
        } else if name.contains("client") {
            Role::Client
        } else {
            Role::Unspecified
        }
    }

    /// The role this role is allowed to see, if restricted.
    pub fn counterpart(self) -> Option<Role> {
        match self {
            Role::Server => Some(Role::Client),
            Role::Client => Some(Role::Server),
            Role::Unspecified => None,
        }
    }
}
