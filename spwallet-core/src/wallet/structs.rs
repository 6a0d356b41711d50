use std::fmt;
use std::str::FromStr;

use bitcoin::hashes::Hash;
use bitcoin::key::TweakedPublicKey;
use bitcoin::secp256k1::XOnlyPublicKey;
use bitcoin::{Amount, OutPoint, ScriptBuf, Txid};
use serde::{Deserialize, Serialize};
use sp_address::Network as SpNetwork;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Signet,
    Regtest,
}

impl From<Network> for bitcoin::Network {
    fn from(value: Network) -> Self {
        match value {
            Network::Mainnet => bitcoin::Network::Bitcoin,
            Network::Testnet => bitcoin::Network::Testnet,
            Network::Signet => bitcoin::Network::Signet,
            Network::Regtest => bitcoin::Network::Regtest,
        }
    }
}

impl From<Network> for SpNetwork {
    fn from(value: Network) -> Self {
        match value {
            Network::Mainnet => SpNetwork::Mainnet,
            Network::Testnet | Network::Signet => SpNetwork::Testnet,
            Network::Regtest => SpNetwork::Regtest,
        }
    }
}

impl Network {
    /// Whether silent payment addresses of `sp_network` can be paid from this network.
    ///
    /// Regtest also takes `tsp` addresses, the prefix most tooling uses for every
    /// network other than mainnet.
    pub fn accepts_silent_payment_network(&self, sp_network: SpNetwork) -> bool {
        match self {
            Network::Regtest => matches!(sp_network, SpNetwork::Regtest | SpNetwork::Testnet),
            _ => SpNetwork::from(*self) == sp_network,
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" | "bitcoin" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "signet" => Ok(Network::Signet),
            "regtest" => Ok(Network::Regtest),
            _ => Err(Error::SpAddress(sp_address::Error::InvalidNetwork(
                s.to_string(),
            ))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Signet => "signet",
            Network::Regtest => "regtest",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtxoState {
    Unconfirmed,
    Unspent,
    Spent,
    UnconfirmedSpent,
}

/// An output owned by the wallet, as reported by the scanning service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Display order, as shown by block explorers.
    #[serde(with = "hex::serde")]
    pub txid: [u8; 32],
    pub vout: u32,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub amount: Amount,
    /// Taproot output key.
    pub pub_key: XOnlyPublicKey,
    /// Added to the spend secret this gives the key controlling `pub_key`.
    #[serde(with = "hex::serde")]
    pub priv_key_tweak: [u8; 32],
    pub timestamp: u64,
    pub state: UtxoState,
    /// Label index the output was received on, if any.
    pub label: Option<u32>,
}

impl Utxo {
    /// The outpoint as it appears on the wire. The txid bytes are reversed
    /// relative to [`Utxo::txid`].
    pub fn outpoint(&self) -> OutPoint {
        let mut txid = self.txid;
        txid.reverse();
        OutPoint::new(Txid::from_byte_array(txid), self.vout)
    }

    pub fn script_pubkey(&self) -> ScriptBuf {
        ScriptBuf::new_p2tr_tweaked(TweakedPublicKey::dangerous_assume_tweaked(self.pub_key))
    }

    pub fn is_spendable(&self) -> bool {
        self.state == UtxoState::Unspent
    }
}

/// Balance of a set of outputs, per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
    pub confirmed: Amount,
    pub unconfirmed: Amount,
    pub pending_spend: Amount,
}

pub fn balance(utxos: &[Utxo]) -> Balance {
    utxos.iter().fold(Balance::default(), |mut acc, utxo| {
        match utxo.state {
            UtxoState::Unspent => acc.confirmed += utxo.amount,
            UtxoState::Unconfirmed => acc.unconfirmed += utxo.amount,
            UtxoState::UnconfirmedSpent => acc.pending_spend += utxo.amount,
            UtxoState::Spent => {}
        }
        acc
    })
}
