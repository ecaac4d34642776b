use bitcoin::{Network, Txid};

use crate::draft::{FeeEstimates, Utxo};
use crate::error::Result;

/// Network-side collaborator: UTXO set, fee estimates, previous
/// transactions for legacy inputs, and the broadcast sink.
///
/// Implementations own their timeout and retry policy; the engine performs
/// no retries of its own.
#[async_trait::async_trait]
pub trait ChainSource: Send + Sync {
    /// The wallet's current unspent outputs.
    async fn utxos(&self, network: Network) -> Result<Vec<Utxo>>;

    /// Current fee estimates in sat/vbyte.
    async fn fee_estimates(&self, network: Network) -> Result<FeeEstimates>;

    /// Raw bytes of a previous transaction. Needed only when spending
    /// legacy inputs, which sign over the entire spent transaction.
    async fn raw_transaction(&self, txid: Txid) -> Result<Vec<u8>>;

    /// Submit a serialized transaction; returns the network's txid for it.
    async fn broadcast(&self, tx_hex: &str) -> Result<Txid>;
}

/// Key-material collaborator. Values obtained here must never be logged or
/// persisted by this crate.
pub trait SecretStore {
    fn seed_phrase(&self) -> Result<bip39::Mnemonic>;

    fn passphrase(&self) -> Option<String>;
}
