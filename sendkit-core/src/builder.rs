//! Unsigned transaction assembly.
//!
//! Consumes a draft plus its selected UTXOs and produces a PSBT with every
//! input annotated for signing: witness UTXOs for segwit inputs, the full
//! previous transaction for legacy inputs (legacy signing commits to the
//! entire spent transaction, not just its output).

use bitcoin::{
    absolute::LockTime, consensus, script::PushBytesBuf, transaction::Version, Amount, Psbt,
    Sequence, Transaction, TxIn, TxOut, Witness,
};
use rand::{seq::SliceRandom, RngCore};

use crate::accounting::{sum_output_values, sum_utxo_values};
use crate::address::require_network;
use crate::backend::ChainSource;
use crate::constants::{MAX_DATA_LEN, MIN_DATA_LEN};
use crate::draft::{AddressType, DraftTransaction, Utxo};
use crate::error::{Error, Result};

/// Strategy deciding the final position of the transaction outputs.
///
/// Production flows shuffle so the change output cannot be identified by
/// position; deterministic tests preserve the assembled order.
pub trait OutputOrdering {
    fn arrange(&mut self, outputs: &mut [TxOut]);
}

/// Fisher-Yates shuffle driven by the supplied RNG. Seed the RNG to make
/// the ordering reproducible.
pub struct Shuffle<R: RngCore>(pub R);

impl<R: RngCore> OutputOrdering for Shuffle<R> {
    fn arrange(&mut self, outputs: &mut [TxOut]) {
        outputs.shuffle(&mut self.0);
    }
}

/// Keep outputs in assembly order: explicit outputs, change, data carrier.
pub struct Preserve;

impl OutputOrdering for Preserve {
    fn arrange(&mut self, _outputs: &mut [TxOut]) {}
}

/// Wrap `message` as a zero-value OP_RETURN output, space-padding it to the
/// minimum embeddable length first.
fn data_carrier_output(message: &str) -> Result<TxOut> {
    let mut payload = message.as_bytes().to_vec();
    if payload.len() > MAX_DATA_LEN {
        return Err(Error::DataTooLarge {
            len: payload.len(),
            max: MAX_DATA_LEN,
        });
    }
    while payload.len() < MIN_DATA_LEN {
        payload.push(b' ');
    }
    let push_bytes = PushBytesBuf::try_from(payload)?;
    Ok(TxOut {
        value: Amount::ZERO,
        script_pubkey: bitcoin::ScriptBuf::new_op_return(push_bytes),
    })
}

/// Build the unsigned transaction described by `draft`, spending `utxos`.
///
/// The sequence policy is transaction-wide: with RBF every input signals
/// replaceability, without it every input is final. Legacy inputs require a
/// previous-transaction lookup through `chain`; that lookup is the only
/// suspension point.
pub async fn build_unsigned<C: ChainSource + ?Sized>(
    draft: &DraftTransaction,
    utxos: &[Utxo],
    ordering: &mut dyn OutputOrdering,
    chain: &C,
    network: bitcoin::Network,
) -> Result<Psbt> {
    let input_value = sum_utxo_values(utxos)?;
    let output_value = sum_output_values(draft.outputs())?;

    if utxos.is_empty() {
        return Err(Error::NoInputs);
    }

    let mut targets = Vec::with_capacity(draft.outputs().len() + 2);
    for (index, output) in draft.outputs().iter().enumerate() {
        match (&output.address, &output.script) {
            (Some(address), None) => {
                if output.value == Amount::ZERO {
                    return Err(Error::ZeroValueOutput(index));
                }
                targets.push(TxOut {
                    value: output.value,
                    script_pubkey: require_network(address, network)?.script_pubkey(),
                });
            }
            (None, Some(script)) => {
                if output.value != Amount::ZERO {
                    return Err(Error::DataOutputNonZero);
                }
                targets.push(TxOut {
                    value: Amount::ZERO,
                    script_pubkey: script.clone(),
                });
            }
            (None, None) => return Err(Error::MissingRecipient(index)),
            (Some(_), Some(_)) => return Err(Error::AmbiguousRecipient(index)),
        }
    }

    if let Some(change_address) = draft.change_address() {
        let spent = output_value
            .checked_add(draft.fee())
            .ok_or(Error::ValueOverflow)?;
        let change = input_value
            .checked_sub(spent)
            .ok_or(Error::InsufficientFunds)?;
        targets.push(TxOut {
            value: change,
            script_pubkey: require_network(change_address, network)?.script_pubkey(),
        });
    }

    if !draft.message().is_empty() {
        targets.push(data_carrier_output(draft.message())?);
    }

    if targets.is_empty() {
        return Err(Error::NoRecipients);
    }

    ordering.arrange(&mut targets);

    let sequence = if draft.rbf() {
        Sequence::ENABLE_RBF_NO_LOCKTIME
    } else {
        Sequence::MAX
    };

    let inputs = utxos
        .iter()
        .map(|utxo| TxIn {
            previous_output: utxo.outpoint(),
            script_sig: bitcoin::ScriptBuf::new(),
            sequence,
            witness: Witness::new(),
        })
        .collect();

    let unsigned_tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs,
        output: targets,
    };

    let mut psbt = Psbt::from_unsigned_tx(unsigned_tx)?;

    for (index, utxo) in utxos.iter().enumerate() {
        match utxo.address_type {
            AddressType::NativeSegwit | AddressType::NestedSegwit => {
                let script_pubkey = require_network(&utxo.address, network)?.script_pubkey();
                psbt.inputs[index].witness_utxo = Some(TxOut {
                    value: utxo.value,
                    script_pubkey,
                });
            }
            AddressType::Legacy => {
                let raw = chain
                    .raw_transaction(utxo.tx_hash)
                    .await
                    .map_err(|_| Error::UnresolvedPrevTx(utxo.tx_hash))?;
                let prev_tx: Transaction = consensus::deserialize(&raw)?;
                if prev_tx.compute_txid() != utxo.tx_hash {
                    return Err(Error::UnresolvedPrevTx(utxo.tx_hash));
                }
                psbt.inputs[index].non_witness_utxo = Some(prev_tx);
            }
        }
    }

    log::debug!(
        "built unsigned tx: {} inputs, {} outputs, fee {}",
        psbt.unsigned_tx.input.len(),
        psbt.unsigned_tx.output.len(),
        draft.fee()
    );

    Ok(psbt)
}
