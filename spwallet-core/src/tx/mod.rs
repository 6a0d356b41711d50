//! Transaction assembly, signing and fee validation.
//!
//! - [`Vin`] - an input together with the material needed to sign it
//! - [`builder`] - unsigned transaction in BIP69 order
//! - [`signer`] - taproot key path signatures, finalized through a PSBT
//! - [`fee`] - realized fee rate check

pub mod builder;
pub mod fee;
pub mod signer;

pub use builder::build_unsigned_tx;
pub use fee::validate_fee_rate;
pub use signer::sign_transaction;

use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::{Amount, OutPoint, ScriptBuf, TxOut};

use crate::error::{Error, Result};
use crate::keys::derive_private_key_for_utxo;
use crate::protocol::sending::even_y_secret;
use crate::wallet::Utxo;

/// A selected input. Only lives for the duration of a send.
#[derive(Debug, Clone)]
pub struct Vin {
    /// Wire order txid.
    pub outpoint: OutPoint,
    pub amount: Amount,
    pub script_pubkey: ScriptBuf,
    /// Normalized to an even Y public key.
    pub secret_key: SecretKey,
    pub taproot: bool,
}

impl Vin {
    /// Rebuild the signing key of `utxo` and check that it controls the output.
    pub fn from_utxo(utxo: &Utxo, spend_secret: &SecretKey) -> Result<Self> {
        let secp = Secp256k1::new();
        let secret_key = derive_private_key_for_utxo(spend_secret, &utxo.priv_key_tweak)?;
        let secret_key = even_y_secret(&secp, secret_key);

        let (xonly, _) = secret_key.x_only_public_key(&secp);
        if xonly != utxo.pub_key {
            return Err(Error::InternalInconsistency(format!(
                "tweak of {} does not match its output key",
                utxo.outpoint()
            )));
        }

        Ok(Self {
            outpoint: utxo.outpoint(),
            amount: utxo.amount,
            script_pubkey: utxo.script_pubkey(),
            secret_key,
            taproot: true,
        })
    }

    pub fn prevout(&self) -> TxOut {
        TxOut {
            value: self.amount,
            script_pubkey: self.script_pubkey.clone(),
        }
    }
}
