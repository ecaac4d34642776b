//! Collaborator contracts consumed by the engine.
//!
//! The engine itself is synchronous and in-memory; only the network
//! collaborator crosses an I/O boundary and is therefore async. Timeout and
//! retry policy belong to the implementation, never to this crate.

mod backend;

pub use backend::{ChainSource, SecretStore};
