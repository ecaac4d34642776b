use bitcoin::Txid;
use serde::Deserialize;

/// One entry of `GET /address/{address}/utxo`.
#[derive(Debug, Clone, Deserialize)]
pub struct UtxoResponse {
    pub txid: Txid,
    pub vout: u32,
    pub value: u64,
    pub status: UtxoStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UtxoStatus {
    pub confirmed: bool,
    pub block_height: Option<u32>,
}
