//! Sync Module - the link to the hub.
//!
//! This module owns the single uplink: its transport, handshake and line
//! loop ([`manager`]), the handle the supervisor keeps ([`link`]) and the
//! supervisor that replaces dead links ([`supervisor`]).

pub mod handshake;
pub mod link;
pub mod manager;
pub mod stream;
pub mod supervisor;

pub use link::{LinkCommand, LinkHandle, LinkStatus};
pub use manager::LinkManager;
pub use supervisor::Supervisor;
