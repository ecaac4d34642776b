use std::collections::HashMap;
use std::str::FromStr;

use bitcoin::Txid;
use url::Url;

use super::http_trait::HttpClient;
use super::structs::UtxoResponse;
use crate::error::{Error, Result};

/// Client for the Esplora HTTP API (blockstream.info, mempool.space and
/// self-hosted instances).
///
/// Generic over the HTTP client implementation, allowing consumers to
/// provide their own by implementing the `HttpClient` trait.
#[derive(Clone)]
pub struct EsploraClient<H: HttpClient> {
    http_client: H,
    host_url: Url,
}

impl<H: HttpClient> EsploraClient<H> {
    pub fn new(host_url: String, http_client: H) -> Result<Self> {
        let mut host_url = Url::parse(&host_url)?;

        // we need a trailing slash, if not present we append it
        if !host_url.path().ends_with('/') {
            host_url.set_path(&format!("{}/", host_url.path()));
        }

        Ok(EsploraClient {
            http_client,
            host_url,
        })
    }

    /// Unspent outputs of a single address, confirmed and mempool.
    pub async fn address_utxos(&self, address: &str) -> Result<Vec<UtxoResponse>> {
        let url = self.host_url.join(&format!("address/{}/utxo", address))?;
        let body = self.http_client.get(url.as_str(), &[]).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fee estimates as a map from confirmation target (blocks, as a
    /// string) to sat/vbyte.
    pub async fn fee_estimates(&self) -> Result<HashMap<String, f64>> {
        let url = self.host_url.join("fee-estimates")?;
        let body = self.http_client.get(url.as_str(), &[]).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Raw transaction hex. The endpoint replies with plain text.
    pub async fn tx_hex(&self, txid: Txid) -> Result<String> {
        let url = self.host_url.join(&format!("tx/{}/hex", txid))?;
        let body = self.http_client.get(url.as_str(), &[]).await?;
        Ok(body.trim().to_string())
    }

    /// Submit raw transaction hex; the reply body is the txid.
    pub async fn broadcast(&self, tx_hex: &str) -> Result<Txid> {
        let url = self.host_url.join("tx")?;
        let body = self.http_client.post(url.as_str(), tx_hex).await?;
        let reply = body.trim();
        Txid::from_str(reply).map_err(|_| Error::InvalidTxid(reply.to_string()))
    }
}
