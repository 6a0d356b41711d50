use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::transaction::Version;
use bitcoin::{OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};

use crate::constants::TX_VERSION;
use crate::error::{Error, Result};
use crate::recipient::Recipient;
use crate::tx::Vin;

/// BIP69 compares txids in the order block explorers display them, the reverse of
/// the wire order [`OutPoint`] sorts by.
fn bip69_input_key(outpoint: &OutPoint) -> ([u8; 32], u32) {
    let mut txid = outpoint.txid.to_byte_array();
    txid.reverse();
    (txid, outpoint.vout)
}

/// Assemble the unsigned transaction spending `vins` to `recipients`.
///
/// Every recipient must already be resolved. Inputs and outputs are sorted as
/// described in BIP69.
pub fn build_unsigned_tx(vins: &[Vin], recipients: &[Recipient]) -> Result<Transaction> {
    let mut input: Vec<TxIn> = vins
        .iter()
        .map(|vin| TxIn {
            previous_output: vin.outpoint,
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        })
        .collect();
    input.sort_by_key(|txin| bip69_input_key(&txin.previous_output));

    let mut output = recipients
        .iter()
        .map(|recipient| match recipient {
            Recipient::Resolved {
                script_pubkey,
                amount,
            } => Ok(TxOut {
                value: *amount,
                script_pubkey: script_pubkey.clone(),
            }),
            unresolved => Err(Error::InternalInconsistency(format!(
                "recipient {} was not resolved before assembly",
                unresolved
            ))),
        })
        .collect::<Result<Vec<TxOut>>>()?;
    output.sort_by(|a, b| {
        a.value
            .cmp(&b.value)
            .then_with(|| a.script_pubkey.as_bytes().cmp(b.script_pubkey.as_bytes()))
    });

    Ok(Transaction {
        version: Version(TX_VERSION),
        lock_time: LockTime::ZERO,
        input,
        output,
    })
}
