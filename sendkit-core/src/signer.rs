//! Transaction signing and finalization.
//!
//! Each input's key is derived from the wallet root by following the UTXO's
//! stored derivation path exactly; paths are recorded when an address is
//! generated and the signer never searches for them. Signing is
//! all-or-nothing: the first failing input aborts the whole operation.

use bitcoin::{
    bip32::Xpriv,
    consensus::encode,
    ecdsa,
    hashes::Hash,
    key::Secp256k1,
    script::{Builder, PushBytesBuf},
    secp256k1::{All, Message, SecretKey},
    sighash::SighashCache,
    CompressedPublicKey, EcdsaSighashType, Network, Psbt, ScriptBuf, Transaction, Witness,
};

use crate::draft::{AddressType, SignedTransaction, Utxo};
use crate::error::{Error, Result};

/// Sign every input of `psbt`, finalize, and serialize.
///
/// `utxos` must be the same list the transaction was built from, in input
/// order. The seed phrase and optional passphrase come from the secret
/// store; neither is ever logged.
pub fn sign(
    psbt: Psbt,
    utxos: &[Utxo],
    mnemonic: &bip39::Mnemonic,
    passphrase: &str,
    network: Network,
) -> Result<SignedTransaction> {
    if psbt.unsigned_tx.input.len() != utxos.len() {
        return Err(Error::InputCountMismatch);
    }

    let secp = Secp256k1::new();
    let seed = mnemonic.to_seed(passphrase);
    let root = Xpriv::new_master(network, &seed).map_err(|_| Error::SeedDerivation)?;

    let mut psbt = psbt;
    let unsigned_tx = psbt.unsigned_tx.clone();
    let mut cache = SighashCache::new(&unsigned_tx);

    for (index, utxo) in utxos.iter().enumerate() {
        sign_input(&mut psbt, &mut cache, index, utxo, &root, &secp)?;
    }

    let tx = psbt
        .extract_tx()
        .map_err(|e| Error::ExtractTx(e.to_string()))?;
    let txid = tx.compute_txid();
    log::info!("signed transaction {}", txid);

    Ok(SignedTransaction::new(encode::serialize_hex(&tx), txid))
}

fn sign_input(
    psbt: &mut Psbt,
    cache: &mut SighashCache<&Transaction>,
    index: usize,
    utxo: &Utxo,
    root: &Xpriv,
    secp: &Secp256k1<All>,
) -> Result<()> {
    let child = root
        .derive_priv(secp, &utxo.derivation_path)
        .map_err(|_| Error::KeyDerivation(index))?;
    let secret_key = child.private_key;
    let public_key = CompressedPublicKey(secret_key.public_key(secp));

    match utxo.address_type {
        AddressType::NativeSegwit => {
            let witness_utxo = psbt.inputs[index]
                .witness_utxo
                .clone()
                .ok_or(Error::MissingWitnessUtxo(index))?;
            let script_pubkey = ScriptBuf::new_p2wpkh(&public_key.wpubkey_hash());
            if witness_utxo.script_pubkey != script_pubkey {
                return Err(Error::ScriptMismatch(index));
            }

            let sighash = cache
                .p2wpkh_signature_hash(
                    index,
                    &script_pubkey,
                    witness_utxo.value,
                    EcdsaSighashType::All,
                )
                .map_err(|e| Error::Sighash(e.to_string()))?;
            let signature = ecdsa_sign(secp, sighash.to_byte_array(), &secret_key);

            psbt.inputs[index].final_script_witness =
                Some(Witness::p2wpkh(&signature, &public_key.0));
        }
        AddressType::NestedSegwit => {
            let witness_utxo = psbt.inputs[index]
                .witness_utxo
                .clone()
                .ok_or(Error::MissingWitnessUtxo(index))?;
            let redeem_script = ScriptBuf::new_p2wpkh(&public_key.wpubkey_hash());
            let script_pubkey = ScriptBuf::new_p2sh(&redeem_script.script_hash());
            if witness_utxo.script_pubkey != script_pubkey {
                return Err(Error::ScriptMismatch(index));
            }

            // BIP143: the script code of a nested P2WPKH input is the
            // P2WPKH script of the redeem script's program.
            let sighash = cache
                .p2wpkh_signature_hash(
                    index,
                    &redeem_script,
                    witness_utxo.value,
                    EcdsaSighashType::All,
                )
                .map_err(|e| Error::Sighash(e.to_string()))?;
            let signature = ecdsa_sign(secp, sighash.to_byte_array(), &secret_key);

            psbt.inputs[index].final_script_witness =
                Some(Witness::p2wpkh(&signature, &public_key.0));
            let redeem_push = PushBytesBuf::try_from(redeem_script.into_bytes())?;
            psbt.inputs[index].final_script_sig =
                Some(Builder::new().push_slice(redeem_push).into_script());
        }
        AddressType::Legacy => {
            let prev_tx = psbt.inputs[index]
                .non_witness_utxo
                .clone()
                .ok_or(Error::MissingPrevTx(index))?;
            let prev_out = prev_tx
                .output
                .get(utxo.tx_pos as usize)
                .ok_or(Error::MissingPrevTx(index))?;
            let script_pubkey = ScriptBuf::new_p2pkh(&public_key.pubkey_hash());
            if prev_out.script_pubkey != script_pubkey {
                return Err(Error::ScriptMismatch(index));
            }

            let sighash = cache
                .legacy_signature_hash(index, &script_pubkey, EcdsaSighashType::All.to_u32())
                .map_err(|e| Error::Sighash(e.to_string()))?;
            let signature = ecdsa_sign(secp, sighash.to_byte_array(), &secret_key);

            psbt.inputs[index].final_script_sig = Some(
                Builder::new()
                    .push_slice(signature.serialize())
                    .push_key(&public_key.into())
                    .into_script(),
            );
        }
    }

    Ok(())
}

fn ecdsa_sign(
    secp: &Secp256k1<All>,
    digest: [u8; 32],
    secret_key: &SecretKey,
) -> ecdsa::Signature {
    let message = Message::from_digest(digest);
    ecdsa::Signature {
        signature: secp.sign_ecdsa(&message, secret_key),
        sighash_type: EcdsaSighashType::All,
    }
}
