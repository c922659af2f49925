//! peerview integration tests.
//!
//! Each test boots the signaling router in-process on 127.0.0.1:0 and
//! drives it over HTTP, so no external setup is needed:
//!
//!   cargo test --test integration

mod signaling;

pub use infra::*;
