//! Wallet send engine: draft editing, fee policy, transaction building,
//! signing, and broadcast, with all network and key-material access behind
//! collaborator traits.

mod accounting;
mod address;
mod backend;
mod broadcast;
mod builder;
pub mod constants;
mod controller;
mod draft;
mod error;
mod flow;
mod signer;
mod weight;

pub use bip39;
pub use bitcoin;

pub use accounting::{sum_output_values, sum_utxo_values, sum_values};
pub use address::classify_address;
pub use backend::{ChainSource, SecretStore};
pub use broadcast::broadcast;
pub use builder::{build_unsigned, OutputOrdering, Preserve, Shuffle};
pub use controller::{recompute_fee, select_fee_tier};
pub use draft::{
    AddressType, DraftOutput, DraftTransaction, FeeEstimates, FeeTier, SignedTransaction, Utxo,
    WalletContext,
};
pub use error::{Error, Result};
pub use flow::{FlowState, SendFlow};
pub use signer::sign;
pub use weight::{estimate_vbytes, InputKind, OutputKind};
