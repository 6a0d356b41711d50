//! BIP352 Silent Payments sender-side primitives.
//!
//! - [`hash`] - the tagged hashes defined by BIP352
//! - [`sending`] - input aggregation and output key derivation
#![allow(non_snake_case)]

pub(crate) mod hash;
pub mod sending;

pub use sending::{calculate_partial_secret, generate_recipient_pubkeys};
