//! Send-flow state machine.
//!
//! One [`SendFlow`] exists per in-progress send. It exclusively owns the
//! draft, so edits are serialized by construction and the fee invariant
//! cannot be broken by interleaved updates. Build and sign failures drop
//! their artifacts and return the flow to `Drafting`; a failed broadcast
//! additionally resets the draft, since it usually means the UTXO or fee
//! state underneath it went stale.

use bitcoin::{Network, Psbt, Txid};

use crate::backend::{ChainSource, SecretStore};
use crate::broadcast;
use crate::builder::{self, OutputOrdering};
use crate::controller;
use crate::draft::{DraftTransaction, FeeTier, SignedTransaction, WalletContext};
use crate::error::{Error, Result};
use crate::signer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Empty,
    Drafting,
    Built,
    Signed,
    BroadcastPending,
    BroadcastConfirmed,
    BroadcastFailed,
}

pub struct SendFlow {
    state: FlowState,
    draft: DraftTransaction,
    unsigned: Option<Psbt>,
    signed: Option<SignedTransaction>,
}

impl Default for SendFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl SendFlow {
    pub fn new() -> Self {
        Self {
            state: FlowState::Empty,
            draft: DraftTransaction::new(),
            unsigned: None,
            signed: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn draft(&self) -> &DraftTransaction {
        &self.draft
    }

    pub fn signed_transaction(&self) -> Option<&SignedTransaction> {
        self.signed.as_ref()
    }

    fn editable(&self) -> bool {
        matches!(
            self.state,
            FlowState::Empty | FlowState::Drafting | FlowState::BroadcastFailed
        )
    }

    /// Apply an edit to the draft. Only valid before a transaction has been
    /// built; a successful edit moves the flow into `Drafting`.
    pub fn edit(&mut self, f: impl FnOnce(&mut DraftTransaction) -> Result<()>) -> Result<()> {
        if !self.editable() {
            return Err(Error::InvalidFlowState("edit"));
        }
        f(&mut self.draft)?;
        self.enter(FlowState::Drafting);
        Ok(())
    }

    /// Change the fee rate through the fee controller. Rejections leave the
    /// draft untouched; returns whether the rate was applied.
    pub fn set_fee_rate(&mut self, rate: u64, ctx: &WalletContext) -> Result<bool> {
        if !self.editable() {
            return Err(Error::InvalidFlowState("set_fee_rate"));
        }
        match controller::recompute_fee(&self.draft, rate, ctx) {
            Some(updated) => {
                self.draft = updated;
                self.enter(FlowState::Drafting);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Select a named fee tier. Silent on rejection, like [`set_fee_rate`].
    ///
    /// [`set_fee_rate`]: SendFlow::set_fee_rate
    pub fn select_fee_tier(&mut self, tier: FeeTier, ctx: &WalletContext) -> Result<()> {
        if !self.editable() {
            return Err(Error::InvalidFlowState("select_fee_tier"));
        }
        self.draft = controller::select_fee_tier(&self.draft, tier, ctx);
        self.enter(FlowState::Drafting);
        Ok(())
    }

    /// Produce the unsigned transaction from the current draft.
    pub async fn build<C: ChainSource + ?Sized>(
        &mut self,
        ordering: &mut dyn OutputOrdering,
        chain: &C,
        network: Network,
    ) -> Result<()> {
        if self.state != FlowState::Drafting {
            return Err(Error::InvalidFlowState("build"));
        }
        let utxos = self.draft.inputs().to_vec();
        match builder::build_unsigned(&self.draft, &utxos, ordering, chain, network).await {
            Ok(psbt) => {
                self.unsigned = Some(psbt);
                self.enter(FlowState::Built);
                Ok(())
            }
            Err(e) => {
                self.unsigned = None;
                self.enter(FlowState::Drafting);
                Err(e)
            }
        }
    }

    /// Sign the built transaction with keys from the secret store.
    ///
    /// A failure on any input drops the unsigned transaction and returns
    /// the flow to `Drafting`; it is never left holding a partially signed
    /// artifact.
    pub fn sign(&mut self, secrets: &dyn SecretStore, network: Network) -> Result<()> {
        if self.state != FlowState::Built {
            return Err(Error::InvalidFlowState("sign"));
        }
        let psbt = self
            .unsigned
            .take()
            .ok_or(Error::InvalidFlowState("sign"))?;
        let mnemonic = secrets.seed_phrase()?;
        let passphrase = secrets.passphrase().unwrap_or_default();

        match signer::sign(psbt, self.draft.inputs(), &mnemonic, &passphrase, network) {
            Ok(signed) => {
                self.signed = Some(signed);
                self.enter(FlowState::Signed);
                Ok(())
            }
            Err(e) => {
                self.signed = None;
                self.enter(FlowState::Drafting);
                Err(e)
            }
        }
    }

    /// Submit the signed transaction.
    ///
    /// On failure the draft is reset rather than kept for a verbatim retry:
    /// the UTXOs and fee estimates it was built from can no longer be
    /// trusted.
    pub async fn broadcast<C: ChainSource + ?Sized>(&mut self, chain: &C) -> Result<Txid> {
        if self.state != FlowState::Signed {
            return Err(Error::InvalidFlowState("broadcast"));
        }
        let signed = self
            .signed
            .take()
            .ok_or(Error::InvalidFlowState("broadcast"))?;
        self.enter(FlowState::BroadcastPending);

        match broadcast::broadcast(chain, &signed).await {
            Ok(txid) => {
                self.signed = Some(signed);
                self.draft = DraftTransaction::new();
                self.enter(FlowState::BroadcastConfirmed);
                Ok(txid)
            }
            Err(e) => {
                self.draft = DraftTransaction::new();
                self.unsigned = None;
                self.enter(FlowState::BroadcastFailed);
                Err(e)
            }
        }
    }

    /// Abandon the flow. Nothing partially built is ever broadcast.
    pub fn cancel(&mut self) {
        self.draft = DraftTransaction::new();
        self.unsigned = None;
        self.signed = None;
        self.enter(FlowState::Empty);
    }

    fn enter(&mut self, state: FlowState) {
        if self.state != state {
            log::info!("send flow: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{AddressType, FeeEstimates, Utxo};
    use bitcoin::{bip32::DerivationPath, Amount};
    use std::str::FromStr;

    const ADDR: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    fn test_utxo(value: u64) -> Utxo {
        Utxo {
            tx_hash: Txid::from_str(
                "d9b08a9d1698e298b6b1b8f7c64aeb6a4ca99e37b8bdf0c2f70a9e83e1a5ee91",
            )
            .unwrap(),
            tx_pos: 0,
            value: Amount::from_sat(value),
            address: ADDR.to_string(),
            derivation_path: DerivationPath::from_str("m/84'/0'/0'/0/0").unwrap(),
            address_type: AddressType::NativeSegwit,
        }
    }

    fn test_ctx(balance: u64) -> WalletContext {
        WalletContext {
            balance: Amount::from_sat(balance),
            fee_estimates: FeeEstimates {
                fast: 20,
                normal: 5,
                slow: 1,
            },
            network: Network::Bitcoin,
        }
    }

    #[test]
    fn opens_empty_and_edits_move_to_drafting() {
        let mut flow = SendFlow::new();
        assert_eq!(flow.state(), FlowState::Empty);
        assert!(flow.draft().is_empty());

        flow.edit(|d| d.add_recipient(ADDR, Amount::from_sat(50_000)))
            .unwrap();
        assert_eq!(flow.state(), FlowState::Drafting);
        assert_eq!(flow.draft().outputs().len(), 1);
    }

    #[test]
    fn failed_edit_does_not_change_the_draft() {
        let mut flow = SendFlow::new();
        assert!(flow.edit(|d| d.add_recipient(ADDR, Amount::ZERO)).is_err());
        assert_eq!(flow.state(), FlowState::Empty);
        assert!(flow.draft().is_empty());
    }

    #[test]
    fn fee_rejection_is_silent() {
        let mut flow = SendFlow::new();
        flow.edit(|d| {
            d.add_recipient(ADDR, Amount::from_sat(50_000))?;
            d.select_inputs(vec![test_utxo(100_000)]);
            Ok(())
        })
        .unwrap();

        let before = flow.draft().clone();
        // Rate below the floor: applied == false, draft untouched.
        assert!(!flow.set_fee_rate(0, &test_ctx(100_000)).unwrap());
        assert_eq!(flow.draft(), &before);
    }

    #[test]
    fn sign_requires_a_built_transaction() {
        // Sign and broadcast are exercised end to end in the integration
        // tests; here just the state guard.
        let mut flow = SendFlow::new();
        assert!(matches!(
            flow.sign(&PanicStore, Network::Bitcoin),
            Err(Error::InvalidFlowState("sign"))
        ));
        assert_eq!(flow.state(), FlowState::Empty);
    }

    #[test]
    fn cancel_resets_everything() {
        let mut flow = SendFlow::new();
        flow.edit(|d| d.add_recipient(ADDR, Amount::from_sat(50_000)))
            .unwrap();
        flow.cancel();
        assert_eq!(flow.state(), FlowState::Empty);
        assert!(flow.draft().is_empty());
        assert!(flow.signed_transaction().is_none());
    }

    struct PanicStore;

    impl SecretStore for PanicStore {
        fn seed_phrase(&self) -> Result<bip39::Mnemonic> {
            unreachable!("state guard rejects before key material is read")
        }

        fn passphrase(&self) -> Option<String> {
            None
        }
    }
}
