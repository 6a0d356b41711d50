use bitcoin::Amount;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Keys
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(bip39::Error),
    #[error("tweak is not a valid scalar (overflows the curve order)")]
    TweakOverflow,
    #[error("label 0 is reserved for the change address")]
    ReservedLabel,

    // Selection
    #[error("fee rate must be at least 1 sat/vB, got {0}")]
    InvalidFeeRate(u32),
    #[error("recipient {0} has an amount of zero")]
    ZeroRecipientAmount(String),
    #[error("insufficient funds: {available} available, {target} needed before fees")]
    InsufficientFunds { available: Amount, target: Amount },
    #[error("total amount overflows: {0}")]
    AmountOverflow(String),

    // Resolution
    #[error("failed to decode address {address}: {reason}")]
    AddressDecode { address: String, reason: String },
    #[error("wrong network for address {0}")]
    WrongNetwork(String),

    // Validation
    #[error("realized fee rate {realized:.3} sat/vB deviates from requested {requested} sat/vB")]
    FeeRateMismatch { requested: u32, realized: f64 },
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    // Wrapped external errors
    #[error(transparent)]
    Secp256k1(#[from] bitcoin::secp256k1::Error),
    #[error(transparent)]
    Bip32(#[from] bitcoin::bip32::Error),
    #[error(transparent)]
    SpAddress(#[from] sp_address::Error),
}

impl Error {
    /// True for broken invariants, as opposed to failures the user can correct.
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::InternalInconsistency(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
