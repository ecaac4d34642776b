use bitcoin::{bip32::DerivationPath, Amount, Network, Txid};

use sendkit_core::{AddressType, ChainSource, FeeEstimates, Utxo};

use crate::client::{EsploraClient, HttpClient};
use crate::error::{Error, Result};

/// Confirmation targets backing the named fee tiers, in blocks.
const FAST_TARGET: u16 = 2;
const NORMAL_TARGET: u16 = 6;
const SLOW_TARGET: u16 = 144;

/// An address the wallet owns, with the metadata the engine needs to spend
/// from it.
#[derive(Debug, Clone)]
pub struct TrackedAddress {
    pub address: String,
    pub derivation_path: DerivationPath,
    pub address_type: AddressType,
}

/// Esplora-backed implementation of the engine's network collaborator,
/// generic over the HTTP client.
///
/// Esplora has no wallet notion, so the backend carries the list of
/// addresses to watch and queries them one by one.
pub struct EsploraBackend<H: HttpClient> {
    client: EsploraClient<H>,
    addresses: Vec<TrackedAddress>,
    network: Network,
}

impl<H: HttpClient> EsploraBackend<H> {
    pub fn new(
        esplora_url: String,
        http_client: H,
        addresses: Vec<TrackedAddress>,
        network: Network,
    ) -> Result<Self> {
        Ok(Self {
            client: EsploraClient::new(esplora_url, http_client)?,
            addresses,
            network,
        })
    }

    pub fn client(&self) -> &EsploraClient<H> {
        &self.client
    }

    fn check_network(&self, network: Network) -> Result<()> {
        if network != self.network {
            return Err(Error::NetworkMismatch {
                expected: self.network.to_string(),
                got: network.to_string(),
            });
        }
        Ok(())
    }

    fn tier_rate(estimates: &std::collections::HashMap<String, f64>, target: u16) -> Result<u64> {
        let rate = estimates
            .get(&target.to_string())
            .ok_or(Error::MissingFeeTarget(target))?;
        // sat/vbyte as an integer rate, never below the relay floor
        Ok((rate.ceil() as u64).max(1))
    }
}

#[async_trait::async_trait]
impl<H: HttpClient + 'static> ChainSource for EsploraBackend<H> {
    async fn utxos(&self, network: Network) -> sendkit_core::Result<Vec<Utxo>> {
        self.check_network(network)?;

        let mut utxos = Vec::new();
        for tracked in &self.addresses {
            let found = self.client.address_utxos(&tracked.address).await?;
            for utxo in found {
                if !utxo.status.confirmed {
                    continue;
                }
                utxos.push(Utxo {
                    tx_hash: utxo.txid,
                    tx_pos: utxo.vout,
                    value: Amount::from_sat(utxo.value),
                    address: tracked.address.clone(),
                    derivation_path: tracked.derivation_path.clone(),
                    address_type: tracked.address_type,
                });
            }
        }
        log::debug!(
            "esplora: {} spendable utxos across {} addresses",
            utxos.len(),
            self.addresses.len()
        );
        Ok(utxos)
    }

    async fn fee_estimates(&self, network: Network) -> sendkit_core::Result<FeeEstimates> {
        self.check_network(network)?;

        let estimates = self.client.fee_estimates().await?;
        Ok(FeeEstimates {
            fast: Self::tier_rate(&estimates, FAST_TARGET)?,
            normal: Self::tier_rate(&estimates, NORMAL_TARGET)?,
            slow: Self::tier_rate(&estimates, SLOW_TARGET)?,
        })
    }

    async fn raw_transaction(&self, txid: Txid) -> sendkit_core::Result<Vec<u8>> {
        let tx_hex = self.client.tx_hex(txid).await?;
        Ok(hex::decode(tx_hex).map_err(Error::from)?)
    }

    async fn broadcast(&self, tx_hex: &str) -> sendkit_core::Result<Txid> {
        Ok(self.client.broadcast(tx_hex).await?)
    }
}
