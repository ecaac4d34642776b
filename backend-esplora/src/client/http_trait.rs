use async_trait::async_trait;

use crate::error::Result;

/// Minimal async HTTP client trait that can be implemented with any HTTP
/// library.
///
/// Consumers bring their own implementation (hyper, isahc, surf, a
/// platform-specific API) or enable the `reqwest-client` feature for the
/// bundled one.
#[async_trait]
pub trait HttpClient: Send + Sync + Clone {
    /// Perform a GET request, returning the response body as a string.
    async fn get(&self, url: &str, query_params: &[(&str, String)]) -> Result<String>;

    /// Perform a POST request with a plain-text body, returning the
    /// response body as a string. Esplora's broadcast endpoint takes raw
    /// hex, not JSON.
    async fn post(&self, url: &str, body: &str) -> Result<String>;
}
