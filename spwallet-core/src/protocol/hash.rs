//! BIP352 tagged hashes.

use bitcoin::hashes::{sha256t_hash_newtype, Hash, HashEngine};
use bitcoin::secp256k1::{PublicKey, SecretKey};

sha256t_hash_newtype! {
    pub(crate) struct LabelTag = hash_str("BIP0352/Label");

    /// BIP0352-tagged hash with tag \"BIP0352/Label\".
    #[hash_newtype(forward)]
    pub(crate) struct LabelHash(_);
}

sha256t_hash_newtype! {
    pub(crate) struct InputsTag = hash_str("BIP0352/Inputs");

    /// BIP0352-tagged hash with tag \"BIP0352/Inputs\".
    #[hash_newtype(forward)]
    pub(crate) struct InputsHash(_);
}

sha256t_hash_newtype! {
    pub(crate) struct SharedSecretTag = hash_str("BIP0352/SharedSecret");

    /// BIP0352-tagged hash with tag \"BIP0352/SharedSecret\".
    #[hash_newtype(forward)]
    pub(crate) struct SharedSecretHash(_);
}

impl LabelHash {
    pub(crate) fn from_b_scan_and_m(b_scan: &SecretKey, m: u32) -> Self {
        let mut eng = LabelHash::engine();
        eng.input(&b_scan.secret_bytes());
        eng.input(&m.to_be_bytes());
        LabelHash::from_engine(eng)
    }
}

impl InputsHash {
    /// `outpoint_l` is the consensus serialization of the smallest outpoint.
    pub(crate) fn from_outpoint_and_A_sum(outpoint_l: &[u8; 36], A_sum: &PublicKey) -> Self {
        let mut eng = InputsHash::engine();
        eng.input(outpoint_l);
        eng.input(&A_sum.serialize());
        InputsHash::from_engine(eng)
    }
}

impl SharedSecretHash {
    pub(crate) fn from_ecdh_and_k(ecdh: &PublicKey, k: u32) -> Self {
        let mut eng = SharedSecretHash::engine();
        eng.input(&ecdh.serialize());
        eng.input(&k.to_be_bytes());
        SharedSecretHash::from_engine(eng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::sha256;

    fn tagged(tag: &str, msg: &[u8]) -> [u8; 32] {
        let tag_hash = sha256::Hash::hash(tag.as_bytes());
        let mut eng = sha256::Hash::engine();
        eng.input(tag_hash.as_byte_array());
        eng.input(tag_hash.as_byte_array());
        eng.input(msg);
        sha256::Hash::from_engine(eng).to_byte_array()
    }

    #[test]
    fn label_hash_is_tagged_sha256() {
        let b_scan = SecretKey::from_slice(&[0x11; 32]).unwrap();
        let mut msg = [0x11u8; 36].to_vec();
        msg[32..].copy_from_slice(&7u32.to_be_bytes());

        assert_eq!(
            LabelHash::from_b_scan_and_m(&b_scan, 7).to_byte_array(),
            tagged("BIP0352/Label", &msg)
        );
    }

    #[test]
    fn shared_secret_hash_is_tagged_sha256() {
        let secp = bitcoin::secp256k1::Secp256k1::new();
        let point = SecretKey::from_slice(&[0x22; 32]).unwrap().public_key(&secp);
        let mut msg = point.serialize().to_vec();
        msg.extend_from_slice(&[0, 0, 0, 1]);

        assert_eq!(
            SharedSecretHash::from_ecdh_and_k(&point, 1).to_byte_array(),
            tagged("BIP0352/SharedSecret", &msg)
        );
    }
}
