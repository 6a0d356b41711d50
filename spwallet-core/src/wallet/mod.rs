//! Wallet records shared with the persistence layer.
//!
//! - [`Wallet`] - network, mnemonic and the two silent payment secrets
//! - [`Utxo`] - an owned output as reported by the scanning service
//! - [`Network`] - the networks a wallet can live on

mod structs;

pub use structs::*;

use std::time::{SystemTime, UNIX_EPOCH};

use bitcoin::hashes::{sha256, Hash, HashEngine};
use bitcoin::secp256k1::rand::{thread_rng, RngCore};
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use sp_address::SilentPaymentAddress;

use crate::constants::CHANGE_LABEL;
use crate::error::{Error, Result};
use crate::keys::{self, Label};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub network: Network,
    pub mnemonic: String,
    pub scan_secret: SecretKey,
    pub spend_secret: SecretKey,
    /// Unix timestamp, seconds.
    pub created_at: u64,
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl Wallet {
    /// Create a wallet from a fresh 12 word mnemonic.
    pub fn generate(network: Network) -> Result<Self> {
        let mut entropy = [0u8; 16];
        thread_rng().fill_bytes(&mut entropy);
        let mnemonic = bip39::Mnemonic::from_entropy(&entropy).map_err(Error::InvalidMnemonic)?;

        Self::import(&mnemonic.to_string(), network)
    }

    /// Restore a wallet from its mnemonic. Importing twice yields identical wallets,
    /// apart from `created_at`.
    pub fn import(mnemonic: &str, network: Network) -> Result<Self> {
        let (scan_secret, spend_secret) = keys::derive_keys(mnemonic, network)?;

        Ok(Self {
            network,
            mnemonic: mnemonic.to_string(),
            scan_secret,
            spend_secret,
            created_at: now(),
        })
    }

    pub fn scan_pubkey(&self) -> PublicKey {
        self.scan_secret.public_key(&Secp256k1::signing_only())
    }

    pub fn spend_pubkey(&self) -> PublicKey {
        self.spend_secret.public_key(&Secp256k1::signing_only())
    }

    /// The unlabeled receiving address.
    pub fn address(&self) -> Result<SilentPaymentAddress> {
        keys::base_address(self.scan_pubkey(), self.spend_pubkey(), self.network)
    }

    /// The label used for change outputs.
    pub fn change_label(&self) -> Result<Label> {
        keys::labeled_address(
            &self.scan_secret,
            &self.spend_secret,
            CHANGE_LABEL,
            self.network,
        )
    }

    pub fn change_address(&self) -> Result<SilentPaymentAddress> {
        Ok(self.change_label()?.address)
    }

    /// A labeled receiving address. Label 0 belongs to change and is refused.
    pub fn receive_address(&self, m: u32) -> Result<Label> {
        if m == CHANGE_LABEL {
            return Err(Error::ReservedLabel);
        }
        keys::labeled_address(&self.scan_secret, &self.spend_secret, m, self.network)
    }

    /// First 8 bytes of `sha256(B_scan || B_spend)`.
    pub fn fingerprint(&self) -> [u8; 8] {
        let mut engine = sha256::HashEngine::default();
        engine.input(&self.scan_pubkey().serialize());
        engine.input(&self.spend_pubkey().serialize());
        let hash = sha256::Hash::from_engine(engine);

        let mut fingerprint = [0u8; 8];
        fingerprint.copy_from_slice(&hash.to_byte_array()[..8]);
        fingerprint
    }
}
