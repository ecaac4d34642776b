mod backend;
mod client;
pub mod error;

pub use backend::{EsploraBackend, TrackedAddress};
pub use client::structs;
pub use client::{EsploraClient, HttpClient};

#[cfg(feature = "reqwest-client")]
pub use client::ReqwestClient;

// Re-export core for convenience
pub use sendkit_core::*;
