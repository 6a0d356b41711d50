//! Silent payment output generation for sending.
//!
//! Sending is done in two steps. First [`calculate_partial_secret`] aggregates the
//! private keys of all transaction inputs and multiplies the sum by the input hash.
//! Then [`generate_recipient_pubkeys`] uses that secret to derive one output key per
//! recipient.
//!
//! The partial secret depends on the full input set, so both steps must run after
//! coin selection is final. Outputs computed against a different input set will
//! never be found by the receiver.

use bitcoin::hashes::Hash;
use bitcoin::key::Parity;
use bitcoin::secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey, XOnlyPublicKey};
use bitcoin::OutPoint;
use sp_address::SilentPaymentAddress;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::protocol::hash::{InputsHash, SharedSecretHash};

/// Consensus serialization of an outpoint: txid in wire order, then vout little endian.
fn serialize_outpoint(outpoint: &OutPoint) -> [u8; 36] {
    let mut res = [0u8; 36];
    res[..32].copy_from_slice(&outpoint.txid.to_byte_array());
    res[32..].copy_from_slice(&outpoint.vout.to_le_bytes());
    res
}

/// Returns `sk` or its negation, whichever has an even-Y public key.
pub(crate) fn even_y_secret(secp: &Secp256k1<bitcoin::secp256k1::All>, sk: SecretKey) -> SecretKey {
    let (_, parity) = sk.x_only_public_key(secp);
    if parity == Parity::Odd {
        sk.negate()
    } else {
        sk
    }
}

/// Calculate `input_hash * a_sum` for a set of taproot inputs.
///
/// # Arguments
///
/// * `input_keys` - The private keys of every input, as they control the taproot output key.
///   Keys are normalized to even Y before they are summed.
/// * `outpoints` - The outpoints of every input.
///
/// # Errors
///
/// Fails if there are no inputs, if the keys sum to zero, or if the input hash is not a
/// valid scalar.
pub fn calculate_partial_secret(
    input_keys: &[SecretKey],
    outpoints: &[OutPoint],
) -> Result<SecretKey> {
    let secp = Secp256k1::new();

    let mut keys = input_keys.iter().map(|sk| even_y_secret(&secp, *sk));
    let first = keys.next().ok_or_else(|| {
        Error::InternalInconsistency("no input keys for silent payment derivation".to_string())
    })?;
    let a_sum = keys.try_fold(first, |acc, sk| acc.add_tweak(&Scalar::from(sk)))?;

    let outpoint_l = outpoints
        .iter()
        .map(serialize_outpoint)
        .min()
        .ok_or_else(|| {
            Error::InternalInconsistency("no outpoints for silent payment derivation".to_string())
        })?;

    let A_sum = a_sum.public_key(&secp);
    let input_hash = InputsHash::from_outpoint_and_A_sum(&outpoint_l, &A_sum).to_byte_array();
    let input_hash = Scalar::from_be_bytes(input_hash).map_err(|_| Error::TweakOverflow)?;

    Ok(a_sum.mul_tweak(&input_hash)?)
}

/// `ecdh_shared_secret = partial_secret * B_scan`
pub(crate) fn calculate_ecdh_shared_secret(
    B_scan: &PublicKey,
    partial_secret: &SecretKey,
) -> Result<PublicKey> {
    let secp = Secp256k1::verification_only();
    Ok(B_scan.mul_tweak(&secp, &Scalar::from(*partial_secret))?)
}

pub(crate) fn calculate_t_k(ecdh_shared_secret: &PublicKey, k: u32) -> Result<SecretKey> {
    let hash = SharedSecretHash::from_ecdh_and_k(ecdh_shared_secret, k).to_byte_array();
    SecretKey::from_slice(&hash).map_err(|_| Error::TweakOverflow)
}

/// Create output keys for a set of silent payment recipients.
///
/// This function should only be used once per transaction! If used multiple times, address
/// reuse may occur.
///
/// Recipients sharing a scan key form a group, and `k` counts the outputs within that
/// group, so paying the same address twice yields two distinct outputs.
///
/// # Returns
///
/// A [HashMap] from each address to its output keys, in the order the address appeared
/// in `recipients`.
pub fn generate_recipient_pubkeys(
    recipients: &[SilentPaymentAddress],
    partial_secret: &SecretKey,
) -> Result<HashMap<SilentPaymentAddress, Vec<XOnlyPublicKey>>> {
    let secp = Secp256k1::new();

    let mut silent_payment_groups: HashMap<PublicKey, (PublicKey, Vec<SilentPaymentAddress>)> =
        HashMap::new();
    for address in recipients {
        let B_scan = address.get_scan_key();

        if let Some((_, payments)) = silent_payment_groups.get_mut(&B_scan) {
            payments.push(*address);
        } else {
            let ecdh_shared_secret = calculate_ecdh_shared_secret(&B_scan, partial_secret)?;

            silent_payment_groups.insert(B_scan, (ecdh_shared_secret, vec![*address]));
        }
    }

    let mut result: HashMap<SilentPaymentAddress, Vec<XOnlyPublicKey>> = HashMap::new();
    for (ecdh_shared_secret, group) in silent_payment_groups.into_values() {
        for (k, addr) in (0u32..).zip(group) {
            let t_k = calculate_t_k(&ecdh_shared_secret, k)?;

            let P_k = addr.get_spend_key().combine(&t_k.public_key(&secp))?;
            let (P_k_xonly, _) = P_k.x_only_public_key();

            result.entry(addr).or_default().push(P_k_xonly);
        }
    }
    Ok(result)
}
