//! BIP352 silent payment addresses.
//!
//! A silent payment address is the bech32m encoding of a version symbol followed by
//! the compressed scan and spend public keys of the receiver. Labeled addresses use
//! the same format; only the spend key differs.

use bech32::primitives::decode::{CheckedHrpstring, CheckedHrpstringError};
use bech32::primitives::iter::{ByteIterExt, Fe32IterExt};
use bech32::{Bech32m, Fe32, Hrp};
use secp256k1::PublicKey;
use std::convert::TryFrom;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const PAYLOAD_LENGTH: usize = 66;
const HRP_MAINNET: Hrp = Hrp::parse_unchecked("sp");
const HRP_TESTNET: Hrp = Hrp::parse_unchecked("tsp");
const HRP_REGTEST: Hrp = Hrp::parse_unchecked("sprt");

/// Error types for silent payment address operations.
#[derive(Debug)]
pub enum Error {
    InvalidNetwork(String),
    InvalidAddress(String),
    UnsupportedVersion(u8),
    Bech32Decode(CheckedHrpstringError),
    Secp256k1(secp256k1::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidNetwork(n) => write!(f, "Invalid network: {}", n),
            Error::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            Error::UnsupportedVersion(v) => write!(f, "Unsupported version: {}", v),
            Error::Bech32Decode(e) => write!(f, "Bech32 decode error: {}", e),
            Error::Secp256k1(e) => write!(f, "Secp256k1 error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<CheckedHrpstringError> for Error {
    fn from(e: CheckedHrpstringError) -> Self {
        Error::Bech32Decode(e)
    }
}

impl From<secp256k1::Error> for Error {
    fn from(e: secp256k1::Error) -> Self {
        Error::Secp256k1(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The network format used for this silent payment address.
///
/// There are three network types: Mainnet (`sp1..`), Testnet (`tsp1..`), and Regtest (`sprt1..`).
/// Signet uses the same network type as Testnet.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    fn hrp(self) -> Hrp {
        match self {
            Network::Mainnet => HRP_MAINNET,
            Network::Testnet => HRP_TESTNET,
            Network::Regtest => HRP_REGTEST,
        }
    }

    fn from_hrp(hrp: &Hrp) -> Option<Self> {
        if *hrp == HRP_MAINNET {
            Some(Network::Mainnet)
        } else if *hrp == HRP_TESTNET {
            Some(Network::Testnet)
        } else if *hrp == HRP_REGTEST {
            Some(Network::Regtest)
        } else {
            None
        }
    }
}

impl TryFrom<&str> for Network {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        let res = match value {
            "mainnet" | "bitcoin" | "main" => Self::Mainnet,
            "regtest" => Self::Regtest,
            "testnet" | "signet" | "test" => Self::Testnet,
            _ => return Err(Error::InvalidNetwork(value.to_string())),
        };
        Ok(res)
    }
}

/// Returns true if `addr` carries one of the silent payment prefixes.
///
/// This only inspects the human readable part; the string may still fail to parse.
pub fn has_silent_payment_prefix(addr: &str) -> bool {
    match addr.rfind('1') {
        Some(pos) => {
            let hrp = addr[..pos].to_ascii_lowercase();
            matches!(hrp.as_str(), "sp" | "tsp" | "sprt")
        }
        None => false,
    }
}

/// A silent payment address: a scan key and a (possibly labeled) spend key.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct SilentPaymentAddress {
    version: u8,
    scan_pubkey: PublicKey,
    m_pubkey: PublicKey,
    network: Network,
}

#[cfg(feature = "serde")]
impl Serialize for SilentPaymentAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for SilentPaymentAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let addr_str: String = Deserialize::deserialize(deserializer)?;

        SilentPaymentAddress::try_from(addr_str.as_str()).map_err(serde::de::Error::custom)
    }
}

impl SilentPaymentAddress {
    pub fn new(
        scan_pubkey: PublicKey,
        m_pubkey: PublicKey,
        network: Network,
        version: u8,
    ) -> Result<Self> {
        if version != 0 {
            return Err(Error::UnsupportedVersion(version));
        }

        Ok(SilentPaymentAddress {
            scan_pubkey,
            m_pubkey,
            network,
            version,
        })
    }

    /// Get the scan public key.
    pub fn get_scan_key(&self) -> PublicKey {
        self.scan_pubkey
    }

    /// Get the spend public key. For labeled addresses this is the labeled key.
    pub fn get_spend_key(&self) -> PublicKey {
        self.m_pubkey
    }

    pub fn get_network(&self) -> Network {
        self.network
    }

    pub fn get_version(&self) -> u8 {
        self.version
    }
}

impl fmt::Display for SilentPaymentAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut data = [0u8; PAYLOAD_LENGTH];
        data[..33].copy_from_slice(&self.scan_pubkey.serialize());
        data[33..].copy_from_slice(&self.m_pubkey.serialize());

        // the version is a single 5-bit symbol, not a byte
        let encoded = data
            .iter()
            .copied()
            .bytes_to_fes()
            .with_checksum::<Bech32m>(&self.network.hrp())
            .with_witness_version(Fe32::Q)
            .chars()
            .collect::<String>();

        f.write_str(&encoded)
    }
}

impl TryFrom<&str> for SilentPaymentAddress {
    type Error = Error;

    fn try_from(addr: &str) -> Result<Self> {
        let checked = CheckedHrpstring::new::<Bech32m>(addr)?;

        let hrp = checked.hrp();
        let network = Network::from_hrp(&hrp).ok_or_else(|| {
            Error::InvalidAddress(format!(
                "Wrong prefix, expected \"sp\", \"tsp\", or \"sprt\", got \"{}\"",
                hrp
            ))
        })?;

        let mut payload = checked.fe32_iter::<&mut dyn Iterator<Item = u8>>();
        let version = payload
            .next()
            .ok_or_else(|| Error::InvalidAddress("Missing version".to_string()))?
            .to_u8();
        if version != 0 {
            return Err(Error::UnsupportedVersion(version));
        }

        let data: Vec<u8> = payload.fes_to_bytes().collect();
        if data.len() != PAYLOAD_LENGTH {
            return Err(Error::InvalidAddress(format!(
                "Wrong payload length, expected {}, got {}",
                PAYLOAD_LENGTH,
                data.len()
            )));
        }

        let scan_pubkey = PublicKey::from_slice(&data[..33])?;
        let m_pubkey = PublicKey::from_slice(&data[33..])?;

        SilentPaymentAddress::new(scan_pubkey, m_pubkey, network, version)
    }
}

impl TryFrom<String> for SilentPaymentAddress {
    type Error = Error;

    fn try_from(addr: String) -> Result<Self> {
        addr.as_str().try_into()
    }
}

impl std::str::FromStr for SilentPaymentAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.try_into()
    }
}

impl From<SilentPaymentAddress> for String {
    fn from(val: SilentPaymentAddress) -> Self {
        val.to_string()
    }
}
