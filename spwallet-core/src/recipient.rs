use std::fmt;
use std::str::FromStr;

use bitcoin::{Address, Amount, ScriptBuf};
use sp_address::{has_silent_payment_prefix, SilentPaymentAddress};

use crate::constants::P2TR_SCRIPT_LEN;
use crate::error::{Error, Result};
use crate::Network;

/// A payment destination.
///
/// Recipients start out as [`Recipient::Conventional`] or [`Recipient::SilentPayment`]
/// and become [`Recipient::Resolved`] once their output script is known. Silent payment
/// scripts depend on the final input set, so they can only be resolved after coin
/// selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Conventional {
        address: String,
        amount: Amount,
    },
    SilentPayment {
        address: SilentPaymentAddress,
        amount: Amount,
    },
    Resolved {
        script_pubkey: ScriptBuf,
        amount: Amount,
    },
}

impl Recipient {
    /// Classify a free-form address.
    ///
    /// Strings carrying a silent payment prefix are parsed strictly, a malformed one is
    /// an error and is never treated as a conventional address.
    pub fn parse(address: &str, amount: Amount) -> Result<Self> {
        if has_silent_payment_prefix(address) {
            let address =
                SilentPaymentAddress::try_from(address).map_err(|e| Error::AddressDecode {
                    address: address.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(Recipient::SilentPayment { address, amount })
        } else {
            Ok(Recipient::Conventional {
                address: address.to_string(),
                amount,
            })
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            Recipient::Conventional { amount, .. }
            | Recipient::SilentPayment { amount, .. }
            | Recipient::Resolved { amount, .. } => *amount,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Recipient::Resolved { .. })
    }

    /// Length of the output script this recipient will end up with.
    pub fn script_len(&self, network: Network) -> Result<usize> {
        match self {
            Recipient::Conventional { address, .. } => {
                Ok(conventional_script_pubkey(address, network)?.len())
            }
            Recipient::SilentPayment { .. } => Ok(P2TR_SCRIPT_LEN),
            Recipient::Resolved { script_pubkey, .. } => Ok(script_pubkey.len()),
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Conventional { address, amount } => write!(f, "{} to {}", amount, address),
            Recipient::SilentPayment { address, amount } => write!(f, "{} to {}", amount, address),
            Recipient::Resolved {
                script_pubkey,
                amount,
            } => write!(f, "{} to script {}", amount, script_pubkey.to_hex_string()),
        }
    }
}

/// Decode a standard bitcoin address for `network` and return its output script.
pub(crate) fn conventional_script_pubkey(address: &str, network: Network) -> Result<ScriptBuf> {
    let decode_error = |reason: String| Error::AddressDecode {
        address: address.to_string(),
        reason,
    };

    let unchecked = Address::from_str(address).map_err(|e| decode_error(e.to_string()))?;
    let checked = unchecked
        .require_network(network.into())
        .map_err(|e| decode_error(e.to_string()))?;

    Ok(checked.script_pubkey())
}
