//! Protocol constants and the transaction size model used by coin selection.
//!
//! Sizes are kept in weight units (1 vbyte = 4 WU) so that the quarter-weight
//! witness discount stays exact. See <https://bitcoinops.org/en/tools/calc-size/>.

use bitcoin::Amount;

/// Label index reserved for the wallet's own change address.
pub const CHANGE_LABEL: u32 = 0;

/// Default minimum change, the dust threshold.
pub const DEFAULT_MIN_CHANGE: Amount = Amount::from_sat(546);

/// Default tolerance between the requested and the realized fee rate, in sat/vB.
pub const DEFAULT_FEE_RATE_TOLERANCE: f64 = 0.25;

pub const WITNESS_SCALE_FACTOR: u64 = 4;

pub const TX_VERSION_WU: u64 = 4 * WITNESS_SCALE_FACTOR;
/// Segwit marker and flag, witness data.
pub const SEGWIT_MARKER_FLAG_WU: u64 = 2;
pub const LOCKTIME_WU: u64 = 4 * WITNESS_SCALE_FACTOR;
/// We never build transactions with more than 252 inputs.
pub const INPUT_COUNT_WU: u64 = WITNESS_SCALE_FACTOR;

/// txid + vout + empty script_sig + sequence.
pub const TR_INPUT_OUTPOINT_WU: u64 = (32 + 4 + 1 + 4) * WITNESS_SCALE_FACTOR;
/// Length prefix and the 64 byte schnorr signature of a key path spend.
pub const TR_WITNESS_DATA_WU: u64 = 1 + 64;
/// Witness item count, accounted once.
pub const WITNESS_COUNT_WU: u64 = 1;

pub const OUTPUT_VALUE_WU: u64 = 8 * WITNESS_SCALE_FACTOR;

/// `OP_1 OP_PUSHBYTES_32 <x-only key>`
pub const P2TR_SCRIPT_LEN: usize = 34;

pub const TX_VERSION: i32 = 2;
