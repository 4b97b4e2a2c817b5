//! Integration test common infrastructure.
//!
//! Provides a fake hub to link against and a managed services process.

pub mod hub;
pub mod server;

#[allow(unused_imports)]
pub use hub::FakeHub;
#[allow(unused_imports)]
pub use server::TestServices;
