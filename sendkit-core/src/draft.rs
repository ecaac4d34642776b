//! Draft transaction model.
//!
//! A [`DraftTransaction`] holds the user's current unsent transaction. It is
//! created empty when the send flow opens, edited incrementally, turned into
//! an unsigned transaction by the builder exactly once, and discarded after
//! broadcast or cancellation.
//!
//! Every edit that changes the byte size recomputes the fee from the current
//! rate, so `fee == estimated_vbytes * sats_per_vbyte` holds whenever the
//! draft is ready to build. Rate changes go through the fee controller only,
//! which enforces the wallet balance policy on top.

use std::collections::HashMap;

use bitcoin::{
    address::NetworkUnchecked, bip32::DerivationPath, Address, Amount, Network, OutPoint,
    ScriptBuf, Txid,
};
use serde::{Deserialize, Serialize};

use crate::constants::{FALLBACK_TX_VBYTES, MAX_DATA_LEN, MIN_FEE_RATE};
use crate::error::{Error, Result};
use crate::weight::{self, InputKind, OutputKind};

/// Script kind of an address the wallet can spend from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    /// P2PKH
    Legacy,
    /// P2SH-wrapped P2WPKH
    NestedSegwit,
    /// Native P2WPKH (bech32)
    NativeSegwit,
}

/// An unspent output the wallet controls.
///
/// Identity is `(tx_hash, tx_pos)`; a hash alone is not unique because one
/// transaction can fund several outputs owned by the same wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub tx_hash: Txid,
    pub tx_pos: u32,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub value: Amount,
    pub address: String,
    /// Path the address was generated from; the signer follows it exactly.
    pub derivation_path: DerivationPath,
    pub address_type: AddressType,
}

impl Utxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            txid: self.tx_hash,
            vout: self.tx_pos,
        }
    }
}

/// A payment the draft wants to make.
///
/// Either an address with a non-zero amount, or a raw script with amount
/// zero (data embedding). Never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOutput {
    pub address: Option<String>,
    pub script: Option<ScriptBuf>,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub value: Amount,
}

impl DraftOutput {
    pub fn to_address(address: &str, sats: u64) -> Self {
        Self {
            address: Some(address.to_string()),
            script: None,
            value: Amount::from_sat(sats),
        }
    }

    pub fn to_script(script: ScriptBuf) -> Self {
        Self {
            address: None,
            script: Some(script),
            value: Amount::ZERO,
        }
    }
}

/// Named fee tiers offered by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeTier {
    Fast,
    Normal,
    Slow,
    Custom(u64),
}

/// Current network fee estimates, in sat/vbyte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimates {
    pub fast: u64,
    pub normal: u64,
    pub slow: u64,
}

impl FeeTier {
    /// Resolve this tier against the current estimates.
    pub fn rate(&self, estimates: &FeeEstimates) -> u64 {
        match *self {
            FeeTier::Fast => estimates.fast,
            FeeTier::Normal => estimates.normal,
            FeeTier::Slow => estimates.slow,
            FeeTier::Custom(rate) => rate,
        }
    }
}

/// Wallet-level state the fee controller and builder need, threaded in
/// explicitly instead of read from ambient storage.
#[derive(Debug, Clone, Copy)]
pub struct WalletContext {
    pub balance: Amount,
    pub fee_estimates: FeeEstimates,
    pub network: Network,
}

/// The user's current unsent transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftTransaction {
    pub(crate) outputs: Vec<DraftOutput>,
    pub(crate) inputs: Vec<Utxo>,
    pub(crate) change_address: Option<String>,
    pub(crate) message: String,
    pub(crate) sats_per_vbyte: u64,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub(crate) fee: Amount,
    pub(crate) rbf: bool,
    pub(crate) fee_tier: FeeTier,
}

impl Default for DraftTransaction {
    fn default() -> Self {
        Self {
            outputs: Vec::new(),
            inputs: Vec::new(),
            change_address: None,
            message: String::new(),
            sats_per_vbyte: MIN_FEE_RATE,
            fee: Amount::ZERO,
            rbf: true,
            fee_tier: FeeTier::Normal,
        }
    }
}

impl DraftTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outputs(&self) -> &[DraftOutput] {
        &self.outputs
    }

    pub fn inputs(&self) -> &[Utxo] {
        &self.inputs
    }

    pub fn change_address(&self) -> Option<&str> {
        self.change_address.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn sats_per_vbyte(&self) -> u64 {
        self.sats_per_vbyte
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn rbf(&self) -> bool {
        self.rbf
    }

    pub fn fee_tier(&self) -> FeeTier {
        self.fee_tier
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty() && self.inputs.is_empty() && self.message.is_empty()
    }

    /// Add a payment to `address` of `amount`.
    pub fn add_recipient(&mut self, address: &str, amount: Amount) -> Result<()> {
        if amount == Amount::ZERO {
            return Err(Error::ZeroValueOutput(self.outputs.len()));
        }
        address
            .parse::<Address<NetworkUnchecked>>()
            .map_err(|e| Error::Address(e.to_string()))?;
        self.outputs.push(DraftOutput {
            address: Some(address.to_string()),
            script: None,
            value: amount,
        });
        self.refresh_fee();
        Ok(())
    }

    /// Add a preassembled zero-value data-carrier output.
    pub fn add_data_output(&mut self, script: ScriptBuf, value: Amount) -> Result<()> {
        if value != Amount::ZERO {
            return Err(Error::DataOutputNonZero);
        }
        self.outputs.push(DraftOutput::to_script(script));
        self.refresh_fee();
        Ok(())
    }

    pub fn remove_output(&mut self, index: usize) {
        if index < self.outputs.len() {
            self.outputs.remove(index);
            self.refresh_fee();
        }
    }

    /// Free-text message, embedded as an OP_RETURN output when non-empty.
    pub fn set_message(&mut self, message: &str) -> Result<()> {
        if message.len() > MAX_DATA_LEN {
            return Err(Error::DataTooLarge {
                len: message.len(),
                max: MAX_DATA_LEN,
            });
        }
        self.message = message.to_string();
        self.refresh_fee();
        Ok(())
    }

    pub fn set_change_address(&mut self, address: Option<String>) {
        self.change_address = address;
    }

    pub fn set_rbf(&mut self, rbf: bool) {
        self.rbf = rbf;
    }

    /// Replace the selected inputs.
    pub fn select_inputs(&mut self, inputs: Vec<Utxo>) {
        self.inputs = inputs;
        self.refresh_fee();
    }

    /// Estimated virtual size of the transaction this draft describes.
    ///
    /// Counts the selected inputs and the explicit outputs; the change
    /// output the builder appends is not part of the estimate. Falls back
    /// to [`FALLBACK_TX_VBYTES`] when an output cannot be classified.
    pub fn estimate_vbytes(&self) -> u64 {
        let mut inputs: HashMap<InputKind, u64> = HashMap::new();
        for utxo in &self.inputs {
            *inputs.entry(utxo.address_type.into()).or_insert(0) += 1;
        }

        let mut outputs: HashMap<OutputKind, u64> = HashMap::new();
        // Raw script outputs are priced by their literal byte length.
        let mut script_vbytes: u64 = 0;
        for output in &self.outputs {
            match (&output.address, &output.script) {
                (Some(address), None) => match address.parse::<Address<NetworkUnchecked>>() {
                    Ok(parsed) => {
                        let kind =
                            weight::output_kind_of_script(&parsed.assume_checked().script_pubkey());
                        *outputs.entry(kind).or_insert(0) += 1;
                    }
                    Err(_) => return FALLBACK_TX_VBYTES,
                },
                (None, Some(script)) => script_vbytes += 9 + script.len() as u64,
                _ => return FALLBACK_TX_VBYTES,
            }
        }

        weight::estimate_vbytes(&inputs, &outputs, self.message.len()) + script_vbytes
    }

    /// Recompute the derived fee from the current rate. Called by every
    /// edit that can change the byte size.
    pub(crate) fn refresh_fee(&mut self) {
        self.fee = Amount::from_sat(self.estimate_vbytes().saturating_mul(self.sats_per_vbyte));
    }
}

/// A finalized, broadcastable transaction. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    hex: String,
    txid: Txid,
}

impl SignedTransaction {
    pub(crate) fn new(hex: String, txid: Txid) -> Self {
        Self { hex, txid }
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    pub fn txid(&self) -> Txid {
        self.txid
    }
}
