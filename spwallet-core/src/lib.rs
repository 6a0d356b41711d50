//! Sending side of a BIP352 silent payments wallet.
//!
//! Derives the wallet keys and addresses, selects coins, resolves conventional and
//! silent payment recipients to output scripts, and produces a signed taproot
//! transaction. Scanning, persistence and broadcasting happen elsewhere.

mod coin_selector;
pub mod config;
pub mod constants;
mod error;
pub mod keys;
pub mod protocol;
mod recipient;
pub mod resolver;
mod send;
pub mod tx;
mod wallet;

pub use bitcoin;
pub use sp_address;

pub use coin_selector::{select_coins, SelectionResult};
pub use config::SendConfig;
pub use error::{Error, Result};
pub use keys::Label;
pub use recipient::Recipient;
pub use resolver::resolve;
pub use send::{send_to_recipients, SendOutcome};
pub use tx::Vin;
pub use wallet::*;
