//! Submitting a signed transaction to the network.

use bitcoin::Txid;

use crate::backend::ChainSource;
use crate::draft::SignedTransaction;
use crate::error::{Error, Result};

/// Hand a signed transaction to the chain backend.
///
/// Pure pass-through: the engine adds no retries and no mempool
/// inspection. The backend's reported txid must match the one computed at
/// signing time, otherwise the broadcast is treated as failed.
pub async fn broadcast<C: ChainSource + ?Sized>(
    chain: &C,
    tx: &SignedTransaction,
) -> Result<Txid> {
    let txid = chain.broadcast(tx.hex()).await?;
    if txid != tx.txid() {
        return Err(Error::TxidMismatch {
            expected: tx.txid(),
            got: txid,
        });
    }
    log::info!("broadcast transaction {}", txid);
    Ok(txid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{FeeEstimates, Utxo};
    use bitcoin::Network;
    use std::str::FromStr;

    struct MockSink {
        reply: Txid,
    }

    #[async_trait::async_trait]
    impl ChainSource for MockSink {
        async fn utxos(&self, _network: Network) -> Result<Vec<Utxo>> {
            Ok(vec![])
        }

        async fn fee_estimates(&self, _network: Network) -> Result<FeeEstimates> {
            Ok(FeeEstimates {
                fast: 20,
                normal: 5,
                slow: 1,
            })
        }

        async fn raw_transaction(&self, txid: Txid) -> Result<Vec<u8>> {
            Err(Error::UnresolvedPrevTx(txid))
        }

        async fn broadcast(&self, _tx_hex: &str) -> Result<Txid> {
            Ok(self.reply)
        }
    }

    const TXID: &str = "d9b08a9d1698e298b6b1b8f7c64aeb6a4ca99e37b8bdf0c2f70a9e83e1a5ee91";
    const OTHER: &str = "1f1e1d1c1b1a191817161514131211100f0e0d0c0b0a09080706050403020100";

    #[tokio::test]
    async fn reports_the_confirmed_txid() {
        let txid = Txid::from_str(TXID).unwrap();
        let tx = SignedTransaction::new("00".into(), txid);
        let sink = MockSink { reply: txid };
        assert_eq!(broadcast(&sink, &tx).await.unwrap(), txid);
    }

    #[tokio::test]
    async fn mismatched_txid_is_a_failure() {
        let tx = SignedTransaction::new("00".into(), Txid::from_str(TXID).unwrap());
        let sink = MockSink {
            reply: Txid::from_str(OTHER).unwrap(),
        };
        assert!(matches!(
            broadcast(&sink, &tx).await,
            Err(Error::TxidMismatch { .. })
        ));
    }
}
