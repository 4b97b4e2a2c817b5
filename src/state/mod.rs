//! State management module.
//!
//! Holds the per-link network view: remote users, channels and their
//! membership roles.

mod channel;
mod network;
mod user;

pub use channel::{Channel, Role};
pub use network::NetworkState;
pub use user::RemoteUser;
