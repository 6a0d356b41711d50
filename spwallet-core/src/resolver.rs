//! Turns recipients into output scripts.
//!
//! Must run after coin selection is final: silent payment outputs commit to every
//! input of the transaction.

use std::collections::HashMap;

use bitcoin::key::TweakedPublicKey;
use bitcoin::secp256k1::{SecretKey, XOnlyPublicKey};
use bitcoin::{OutPoint, ScriptBuf};
use sp_address::SilentPaymentAddress;

use crate::error::{Error, Result};
use crate::protocol::{calculate_partial_secret, generate_recipient_pubkeys};
use crate::recipient::{conventional_script_pubkey, Recipient};
use crate::tx::Vin;
use crate::Network;

/// Resolve every recipient to a script, preserving their order.
///
/// Already resolved recipients pass through untouched, so resolving twice is a no-op.
pub fn resolve(
    recipients: Vec<Recipient>,
    vins: &[Vin],
    network: Network,
) -> Result<Vec<Recipient>> {
    let mut sp_addresses = Vec::new();
    for recipient in &recipients {
        if let Recipient::SilentPayment { address, .. } = recipient {
            if !network.accepts_silent_payment_network(address.get_network()) {
                return Err(Error::WrongNetwork(address.to_string()));
            }
            sp_addresses.push(*address);
        }
    }

    let mut sp_outputs = if sp_addresses.is_empty() {
        HashMap::new()
    } else {
        silent_payment_outputs(&sp_addresses, vins)?
    };

    let resolved = recipients
        .into_iter()
        .map(|recipient| match recipient {
            Recipient::Conventional { address, amount } => Ok(Recipient::Resolved {
                script_pubkey: conventional_script_pubkey(&address, network)?,
                amount,
            }),
            Recipient::SilentPayment { address, amount } => {
                let output_key = next_output_key(&mut sp_outputs, &address)?;
                Ok(Recipient::Resolved {
                    script_pubkey: ScriptBuf::new_p2tr_tweaked(
                        TweakedPublicKey::dangerous_assume_tweaked(output_key),
                    ),
                    amount,
                })
            }
            resolved @ Recipient::Resolved { .. } => Ok(resolved),
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some((address, left)) = sp_outputs.iter().find(|(_, keys)| !keys.is_empty()) {
        return Err(Error::InternalInconsistency(format!(
            "{} unused output keys for {}",
            left.len(),
            address
        )));
    }

    Ok(resolved)
}

fn silent_payment_outputs(
    addresses: &[SilentPaymentAddress],
    vins: &[Vin],
) -> Result<HashMap<SilentPaymentAddress, Vec<XOnlyPublicKey>>> {
    let input_keys: Vec<SecretKey> = vins.iter().map(|vin| vin.secret_key).collect();
    let outpoints: Vec<OutPoint> = vins.iter().map(|vin| vin.outpoint).collect();

    let partial_secret = calculate_partial_secret(&input_keys, &outpoints)?;
    let mut outputs = generate_recipient_pubkeys(addresses, &partial_secret)?;

    // Consumed from the front below
    for keys in outputs.values_mut() {
        keys.reverse();
    }

    log::debug!(
        "derived {} silent payment outputs over {} inputs",
        addresses.len(),
        vins.len()
    );
    Ok(outputs)
}

fn next_output_key(
    outputs: &mut HashMap<SilentPaymentAddress, Vec<XOnlyPublicKey>>,
    address: &SilentPaymentAddress,
) -> Result<XOnlyPublicKey> {
    outputs
        .get_mut(address)
        .and_then(|keys| keys.pop())
        .ok_or_else(|| {
            Error::InternalInconsistency(format!("no output key derived for {}", address))
        })
}
