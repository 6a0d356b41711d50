use std::collections::BTreeMap;

use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{Keypair, Message, Secp256k1};
use bitcoin::sighash::{Prevouts, SighashCache, TapSighashType};
use bitcoin::{OutPoint, Psbt, Transaction, TxOut, Witness};

use crate::error::{Error, Result};
use crate::tx::Vin;

fn internal<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> Error + '_ {
    move |e| Error::InternalInconsistency(format!("{}: {}", context, e))
}

/// Sign every input of `unsigned` with the matching [`Vin`] and extract the final
/// transaction.
///
/// Inputs are matched to their signing material by outpoint, so `vins` may be in any
/// order. Silent payment outputs are spent through the key path with the output key
/// itself, no taproot tweak is applied.
pub fn sign_transaction(unsigned: Transaction, vins: &[Vin]) -> Result<Transaction> {
    let secp = Secp256k1::new();

    let signing_material: BTreeMap<OutPoint, &Vin> =
        vins.iter().map(|vin| (vin.outpoint, vin)).collect();
    if signing_material.len() != unsigned.input.len() {
        return Err(Error::InternalInconsistency(format!(
            "{} inputs but signing material for {}",
            unsigned.input.len(),
            signing_material.len()
        )));
    }

    let ordered_vins = unsigned
        .input
        .iter()
        .map(|txin| {
            signing_material
                .get(&txin.previous_output)
                .copied()
                .ok_or_else(|| {
                    Error::InternalInconsistency(format!(
                        "no signing material for input {}",
                        txin.previous_output
                    ))
                })
        })
        .collect::<Result<Vec<&Vin>>>()?;
    let prevouts: Vec<TxOut> = ordered_vins.iter().map(|vin| vin.prevout()).collect();

    let mut psbt = Psbt::from_unsigned_tx(unsigned).map_err(internal("psbt creation"))?;

    let mut witnesses = Vec::with_capacity(ordered_vins.len());
    let mut cache = SighashCache::new(&psbt.unsigned_tx);
    for (input_index, vin) in ordered_vins.iter().enumerate() {
        if !vin.taproot {
            return Err(Error::InternalInconsistency(format!(
                "input {} is not a taproot output",
                vin.outpoint
            )));
        }

        let sighash = cache
            .taproot_key_spend_signature_hash(
                input_index,
                &Prevouts::All(&prevouts),
                TapSighashType::Default,
            )
            .map_err(internal("sighash"))?;

        let msg = Message::from_digest(sighash.to_byte_array());
        let keypair = Keypair::from_secret_key(&secp, &vin.secret_key);
        let signature = secp.sign_schnorr(&msg, &keypair);

        let signature = bitcoin::taproot::Signature {
            signature,
            sighash_type: TapSighashType::Default,
        };
        witnesses.push(Witness::p2tr_key_spend(&signature));
    }

    for ((input, prevout), witness) in psbt.inputs.iter_mut().zip(prevouts).zip(witnesses) {
        input.witness_utxo = Some(prevout);
        input.final_script_witness = Some(witness);
    }

    psbt.extract_tx().map_err(internal("extract"))
}
