//! Peer records and the line protocol used to render views.
//!
//! A view is one line per peer:
//!
//! ```text
//! <name>,<id>,<status>\n
//! ```
//!
//! `status` is `1` while the peer holds a pending wait and `0` otherwise.
//! Every view ends with exactly one trailing newline.

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Directory-assigned peer identifier. Monotonic, starts at 1.
pub type PeerId = u64;

/// Default number of clients a server may claim.
pub const DEFAULT_CAPACITY: u32 = 1;

/// One entry in the peer directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub id: PeerId,
    /// Name the peer signed in with. Carries the role.
    pub name: String,
    /// Liveness: true while the peer is parked on a wait request.
    pub status: bool,
    /// Clients this peer may claim when acting as a server.
    pub capacity: u32,
    /// Server that has claimed this peer. Sticky until removal.
    pub pair_id: Option<PeerId>,
}

impl PeerRecord {
    pub fn new(id: PeerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: false,
            capacity: DEFAULT_CAPACITY,
            pair_id: None,
        }
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn role(&self) -> Role {
        Role::classify(&self.name)
    }

    /// Is this peer claimed by `server`?
    pub fn is_claimed_by(&self, server: PeerId) -> bool {
        self.pair_id == Some(server)
    }

    /// Render as a single view line, without the newline.
    pub fn line(&self) -> String {
        format_line(&self.name, self.id, self.status)
    }

    /// Check that the record can be rendered without corrupting the view.
    pub fn check_renderable(&self) -> Result<(), MalformedName> {
        validate_name(&self.name)
    }

    /// Like `line`, but with reserved characters in the name replaced by `_`
    /// so the result is always a single well-formed line.
    pub fn sanitized_line(&self) -> String {
        let name: String = self
            .name
            .chars()
            .map(|c| if RESERVED.contains(&c) { '_' } else { c })
            .collect();
        format_line(&name, self.id, self.status)
    }
}

fn format_line(name: &str, id: PeerId, status: bool) -> String {
    format!("{},{},{}", name, id, if status { 1 } else { 0 })
}

// ── Names ─────────────────────────────────────────────────────────────────────

/// Characters that would split a field or a line.
const RESERVED: [char; 3] = [',', '\r', '\n'];

/// A peer name that cannot be carried by the line protocol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedName {
    #[error("peer name is empty")]
    Empty,
    #[error("peer name contains a reserved character {0:?}")]
    ReservedChar(char),
}

/// Names must be non-empty and free of the line protocol's separators.
pub fn validate_name(name: &str) -> Result<(), MalformedName> {
    if name.is_empty() {
        return Err(MalformedName::Empty);
    }
    match name.chars().find(|c| RESERVED.contains(c)) {
        Some(c) => Err(MalformedName::ReservedChar(c)),
        None => Ok(()),
    }
}

// ── Views ─────────────────────────────────────────────────────────────────────

/// Join records into a newline-terminated view. Empty input yields "".
pub fn render_lines<'a>(records: impl IntoIterator<Item = &'a PeerRecord>) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&record.line());
        out.push('\n');
    }
    out
}
