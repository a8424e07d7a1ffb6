//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external collaborators. Services
//! depend only on these traits, not on concrete adapters.

mod clock;
mod store;

pub use clock::Clock;
pub use store::KeyValueStore;
