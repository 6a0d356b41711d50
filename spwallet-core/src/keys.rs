//! Scan/spend key derivation and silent payment address generation.

use bitcoin::bip32::{ChildNumber, Xpriv};
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use sp_address::SilentPaymentAddress;

use crate::error::{Error, Result};
use crate::protocol::hash::LabelHash;
use crate::Network;

/// Purpose field of the BIP352 derivation path.
const PURPOSE: u32 = 352;
const SPEND_BRANCH: u32 = 0;
const SCAN_BRANCH: u32 = 1;

/// A labeled silent payment address.
///
/// Labels are recomputable from `(scan_secret, spend_secret, m)` and are never the
/// source of truth for anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub m: u32,
    /// The labeled spend key, `B_spend + tweak * G`.
    pub pub_key: PublicKey,
    #[serde(with = "hex::serde")]
    pub tweak: [u8; 32],
    pub address: SilentPaymentAddress,
}

/// Derive the scan and spend secrets from a BIP39 mnemonic, with an empty passphrase.
///
/// Keys live at `m/352'/coin'/0'/1'/0` (scan) and `m/352'/coin'/0'/0'/0` (spend), where
/// `coin` is 0 on mainnet and 1 on every test network.
pub fn derive_keys(mnemonic: &str, network: Network) -> Result<(SecretKey, SecretKey)> {
    let mnemonic = bip39::Mnemonic::parse(mnemonic).map_err(Error::InvalidMnemonic)?;
    let seed = mnemonic.to_seed("");

    let secp = Secp256k1::new();
    let btc_network: bitcoin::Network = network.into();
    let master_xpriv = Xpriv::new_master(btc_network, &seed)?;

    let coin_type = match network {
        Network::Mainnet => 0,
        _ => 1,
    };
    let base_deriv = [
        ChildNumber::from_hardened_idx(PURPOSE)?,
        ChildNumber::from_hardened_idx(coin_type)?,
        ChildNumber::from_hardened_idx(0)?,
    ];

    let branch = |idx: u32| -> Result<Vec<ChildNumber>> {
        let mut path = base_deriv.to_vec();
        path.push(ChildNumber::from_hardened_idx(idx)?);
        path.push(ChildNumber::from_normal_idx(0)?);
        Ok(path)
    };

    let scan = master_xpriv.derive_priv(&secp, &branch(SCAN_BRANCH)?)?.private_key;
    let spend = master_xpriv.derive_priv(&secp, &branch(SPEND_BRANCH)?)?.private_key;

    Ok((scan, spend))
}

/// Encode the unlabeled address for a scan/spend key pair.
pub fn base_address(
    scan_pubkey: PublicKey,
    spend_pubkey: PublicKey,
    network: Network,
) -> Result<SilentPaymentAddress> {
    Ok(SilentPaymentAddress::new(
        scan_pubkey,
        spend_pubkey,
        network.into(),
        0,
    )?)
}

/// `hash_BIP0352/Label(ser256(b_scan) || ser32(m))` as a scalar.
pub fn label_tweak(scan_secret: &SecretKey, m: u32) -> Result<Scalar> {
    let hash = LabelHash::from_b_scan_and_m(scan_secret, m).to_byte_array();
    Scalar::from_be_bytes(hash).map_err(|_| Error::TweakOverflow)
}

/// Compute the label `m` and its address.
///
/// `m = 0` is the change label. Callers handing out receive addresses must use
/// [`crate::Wallet::receive_address`], which rejects it.
pub fn labeled_address(
    scan_secret: &SecretKey,
    spend_secret: &SecretKey,
    m: u32,
    network: Network,
) -> Result<Label> {
    let secp = Secp256k1::new();
    let scan_pubkey = scan_secret.public_key(&secp);
    let spend_pubkey = spend_secret.public_key(&secp);

    let tweak = label_tweak(scan_secret, m)?;
    let labeled_spend_pubkey = spend_pubkey.add_exp_tweak(&secp, &tweak)?;

    Ok(Label {
        m,
        pub_key: labeled_spend_pubkey,
        tweak: tweak.to_be_bytes(),
        address: base_address(scan_pubkey, labeled_spend_pubkey, network)?,
    })
}

/// `spend_secret + tweak mod n`, the private key controlling a received output.
pub fn derive_private_key_for_utxo(
    spend_secret: &SecretKey,
    tweak: &[u8; 32],
) -> Result<SecretKey> {
    let tweak = Scalar::from_be_bytes(*tweak).map_err(|_| Error::TweakOverflow)?;
    Ok(spend_secret.add_tweak(&tweak)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn derivation_is_deterministic() {
        let first = derive_keys(MNEMONIC, Network::Regtest).unwrap();
        let second = derive_keys(MNEMONIC, Network::Regtest).unwrap();

        assert_eq!(first, second);
        assert_ne!(first.0, first.1);
    }

    #[test]
    fn test_networks_share_coin_type() {
        let signet = derive_keys(MNEMONIC, Network::Signet).unwrap();
        let testnet = derive_keys(MNEMONIC, Network::Testnet).unwrap();
        let mainnet = derive_keys(MNEMONIC, Network::Mainnet).unwrap();

        assert_eq!(signet, testnet);
        assert_ne!(signet, mainnet);
    }

    #[test]
    fn bad_checksum_is_rejected() {
        let bad = MNEMONIC.replace("about", "abandon");
        assert!(matches!(
            derive_keys(&bad, Network::Mainnet),
            Err(Error::InvalidMnemonic(_))
        ));
        assert!(matches!(
            derive_keys("not a mnemonic", Network::Mainnet),
            Err(Error::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn labeled_address_adds_tweak_to_spend_key() {
        let secp = Secp256k1::new();
        let (scan, spend) = derive_keys(MNEMONIC, Network::Mainnet).unwrap();

        let label = labeled_address(&scan, &spend, 3, Network::Mainnet).unwrap();
        let tweak = SecretKey::from_slice(&label.tweak).unwrap();
        let expected = spend.add_tweak(&Scalar::from(tweak)).unwrap().public_key(&secp);

        assert_eq!(label.m, 3);
        assert_eq!(label.pub_key, expected);
        assert_eq!(label.address.get_spend_key(), expected);
        assert_eq!(label.address.get_scan_key(), scan.public_key(&secp));
        assert!(label.address.to_string().starts_with("sp1q"));

        let again = labeled_address(&scan, &spend, 3, Network::Mainnet).unwrap();
        assert_eq!(label, again);
    }

    #[test]
    fn labels_differ_from_base_and_each_other() {
        let secp = Secp256k1::new();
        let (scan, spend) = derive_keys(MNEMONIC, Network::Regtest).unwrap();
        let base = base_address(scan.public_key(&secp), spend.public_key(&secp), Network::Regtest)
            .unwrap();

        let change = labeled_address(&scan, &spend, 0, Network::Regtest).unwrap();
        let one = labeled_address(&scan, &spend, 1, Network::Regtest).unwrap();

        assert_ne!(change.address, base);
        assert_ne!(change.address, one.address);
        assert_eq!(change.address.get_scan_key(), base.get_scan_key());
        assert!(base.to_string().starts_with("sprt1q"));
    }

    #[test]
    fn utxo_key_is_scalar_sum() {
        let spend = SecretKey::from_slice(&[0x42; 32]).unwrap();
        let tweak = [0x01; 32];

        let key = derive_private_key_for_utxo(&spend, &tweak).unwrap();
        let expected = spend
            .add_tweak(&Scalar::from_be_bytes(tweak).unwrap())
            .unwrap();
        assert_eq!(key, expected);

        assert!(matches!(
            derive_private_key_for_utxo(&spend, &[0xff; 32]),
            Err(Error::TweakOverflow)
        ));
    }
}
