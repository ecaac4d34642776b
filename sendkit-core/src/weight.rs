//! Transaction byte-size estimation.
//!
//! Fee rates are quoted in sat/vbyte, so pricing a transaction requires an
//! estimate of its virtual size before it exists. The estimate follows the
//! segwit weight model: non-witness bytes count four weight units each,
//! witness bytes one, and the total is divided by four and rounded up.
//!
//! The estimator is deliberately infallible: any internal inconsistency
//! (counts beyond the safe range, nonsensical multisig parameters, overflow)
//! yields the conservative [`FALLBACK_TX_VBYTES`] estimate instead of an
//! error, so fee calculation can never abort an in-progress edit.

use std::collections::HashMap;

use crate::constants::{FALLBACK_TX_VBYTES, MAX_MULTISIG_KEYS, MAX_SAFE_COUNT};
use crate::draft::AddressType;

/// Spend-side script kind of a transaction input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// P2PKH
    Legacy,
    /// P2SH-wrapped P2WPKH
    NestedSegwit,
    /// Native P2WPKH
    NativeSegwit,
    /// m-of-n P2SH multisig
    MultisigLegacy { required: u8, total: u8 },
    /// m-of-n P2SH-P2WSH multisig
    MultisigNested { required: u8, total: u8 },
    /// m-of-n P2WSH multisig
    MultisigNative { required: u8, total: u8 },
}

impl InputKind {
    /// Estimated weight units spent by one input of this kind, including the
    /// outpoint, sequence and unlocking data. Multisig folds the key count
    /// in linearly: 73 weight per signature, 34 per pushed key, scaled by
    /// four for legacy scripts where the data lives in the scriptSig.
    fn weight(&self) -> Option<u64> {
        let multisig = |required: u8, total: u8| -> Option<u64> {
            if required == 0 || required > total || total > MAX_MULTISIG_KEYS {
                return None;
            }
            Some(73 * required as u64 + 34 * total as u64)
        };

        match *self {
            InputKind::Legacy => Some(148 * 4),
            InputKind::NestedSegwit => Some(64 * 4 + 108),
            InputKind::NativeSegwit => Some(41 * 4 + 108),
            InputKind::MultisigLegacy { required, total } => {
                Some(49 * 4 + 4 * multisig(required, total)?)
            }
            InputKind::MultisigNested { required, total } => {
                Some(76 * 4 + 6 + multisig(required, total)?)
            }
            InputKind::MultisigNative { required, total } => {
                Some(41 * 4 + 6 + multisig(required, total)?)
            }
        }
    }

    fn is_witness(&self) -> bool {
        !matches!(
            self,
            InputKind::Legacy | InputKind::MultisigLegacy { .. }
        )
    }
}

impl From<AddressType> for InputKind {
    fn from(address_type: AddressType) -> Self {
        match address_type {
            AddressType::Legacy => InputKind::Legacy,
            AddressType::NestedSegwit => InputKind::NestedSegwit,
            AddressType::NativeSegwit => InputKind::NativeSegwit,
        }
    }
}

/// Script kind of a transaction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    P2pkh,
    P2sh,
    P2wpkh,
    /// 32-byte witness programs; P2TR outputs are the same size.
    P2wsh,
}

impl OutputKind {
    /// Weight units for one output of this kind: amount, script length
    /// varint and script, all non-witness.
    fn weight(&self) -> u64 {
        match self {
            OutputKind::P2pkh => 34 * 4,
            OutputKind::P2sh => 32 * 4,
            OutputKind::P2wpkh => 31 * 4,
            OutputKind::P2wsh => 43 * 4,
        }
    }
}

/// Byte width of a Bitcoin varint holding `n`.
fn varint_len(n: u64) -> u64 {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

fn estimate_weight(
    inputs: &HashMap<InputKind, u64>,
    outputs: &HashMap<OutputKind, u64>,
) -> Option<u64> {
    let mut n_inputs: u64 = 0;
    let mut n_outputs: u64 = 0;
    let mut weight: u64 = 0;
    let mut has_witness = false;

    for (kind, &count) in inputs {
        if count > MAX_SAFE_COUNT {
            return None;
        }
        n_inputs = n_inputs.checked_add(count)?;
        weight = weight.checked_add(kind.weight()?.checked_mul(count)?)?;
        if count > 0 && kind.is_witness() {
            has_witness = true;
        }
    }

    for (kind, &count) in outputs {
        if count > MAX_SAFE_COUNT {
            return None;
        }
        n_outputs = n_outputs.checked_add(count)?;
        weight = weight.checked_add(kind.weight().checked_mul(count)?)?;
    }

    if n_inputs > MAX_SAFE_COUNT || n_outputs > MAX_SAFE_COUNT {
        return None;
    }

    // Version, locktime and the two count varints, whose width depends on
    // the actual counts.
    let overhead = 4 + 4 + varint_len(n_inputs) + varint_len(n_outputs);
    weight = weight.checked_add(overhead.checked_mul(4)?)?;

    // Segwit marker and flag.
    if has_witness {
        weight = weight.checked_add(2)?;
    }

    Some(weight)
}

/// Estimate the virtual size in vbytes of a transaction with the given
/// input and output counts and an optional embedded message of
/// `message_len` bytes.
///
/// The message contributes two extra bytes per byte of payload; relay
/// policies are conservative about OP_RETURN-bearing transactions, so the
/// estimate errs on the expensive side.
///
/// Returns [`FALLBACK_TX_VBYTES`] when the counts are inconsistent.
pub fn estimate_vbytes(
    inputs: &HashMap<InputKind, u64>,
    outputs: &HashMap<OutputKind, u64>,
    message_len: usize,
) -> u64 {
    let vbytes = estimate_weight(inputs, outputs)
        .map(|weight| weight.div_ceil(4))
        .and_then(|vbytes| vbytes.checked_add(2 * message_len as u64));

    match vbytes {
        Some(vbytes) => vbytes,
        None => FALLBACK_TX_VBYTES,
    }
}

/// Classify a destination script purely for size purposes.
///
/// Anything unrecognized is priced as a 32-byte witness program, the
/// largest standard output script.
pub(crate) fn output_kind_of_script(script: &bitcoin::Script) -> OutputKind {
    if script.is_p2pkh() {
        OutputKind::P2pkh
    } else if script.is_p2sh() {
        OutputKind::P2sh
    } else if script.is_p2wpkh() {
        OutputKind::P2wpkh
    } else {
        OutputKind::P2wsh
    }
}
