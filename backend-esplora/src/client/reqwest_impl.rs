use async_trait::async_trait;

use super::http_trait::HttpClient;
use crate::error::{Error, Result};

/// Async HTTP client implementation using reqwest.
///
/// Enabled with the `reqwest-client` feature. Requests share one
/// connection-pooled client with a 30 second default timeout.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(30)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::HttpGet(e.to_string()))?;
        Ok(Self { client })
    }

    /// Use a preconfigured reqwest client (proxies, custom TLS, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str, query_params: &[(&str, String)]) -> Result<String> {
        let mut request = self.client.get(url);
        for (key, value) in query_params {
            request = request.query(&[(key, value)]);
        }

        request
            .send()
            .await
            .map_err(|e| Error::HttpGet(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::HttpGet(e.to_string()))?
            .text()
            .await
            .map_err(|e| Error::ResponseBody(e.to_string()))
    }

    async fn post(&self, url: &str, body: &str) -> Result<String> {
        self.client
            .post(url)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| Error::HttpPost(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::HttpPost(e.to_string()))?
            .text()
            .await
            .map_err(|e| Error::ResponseBody(e.to_string()))
    }
}
