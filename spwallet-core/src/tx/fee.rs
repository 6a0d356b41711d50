use bitcoin::{Amount, Transaction};

use crate::error::{Error, Result};

/// Check the fee rate the signed transaction actually pays.
///
/// Returns the realized rate in sat/vB.
pub fn validate_fee_rate(
    tx: &Transaction,
    input_total: Amount,
    requested: u32,
    tolerance: f64,
) -> Result<f64> {
    let output_total: Amount = tx.output.iter().map(|o| o.value).sum();
    let fee = input_total.checked_sub(output_total).ok_or_else(|| {
        Error::InternalInconsistency(format!(
            "outputs ({}) exceed inputs ({})",
            output_total, input_total
        ))
    })?;

    let realized = fee.to_sat() as f64 / tx.vsize() as f64;
    if (realized - requested as f64).abs() > tolerance {
        log::warn!(
            "fee rate mismatch: requested {} sat/vB, realized {:.3} sat/vB",
            requested,
            realized
        );
        return Err(Error::FeeRateMismatch {
            requested,
            realized,
        });
    }

    Ok(realized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::absolute::LockTime;
    use bitcoin::transaction::Version;
    use bitcoin::{OutPoint, ScriptBuf, Sequence, TxIn, TxOut, Witness};

    /// One key path input, one P2TR output: 111 vB.
    fn tx(output: u64) -> Transaction {
        Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint::null(),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::from_slice(&[[0u8; 64]]),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(output),
                script_pubkey: ScriptBuf::from_bytes(vec![0x51; 34]),
            }],
        }
    }

    #[test]
    fn within_tolerance() {
        let tx = tx(10_000);
        assert_eq!(tx.vsize(), 111);

        let realized = validate_fee_rate(&tx, Amount::from_sat(10_000 + 1110), 10, 0.25).unwrap();
        assert_eq!(realized, 10.0);

        // 1120 / 111 = 10.09
        assert!(validate_fee_rate(&tx, Amount::from_sat(10_000 + 1120), 10, 0.25).is_ok());
    }

    #[test]
    fn mismatch_carries_both_rates() {
        let tx = tx(10_000);
        let err = validate_fee_rate(&tx, Amount::from_sat(10_000 + 2220), 10, 0.25).unwrap_err();

        match err {
            Error::FeeRateMismatch {
                requested,
                realized,
            } => {
                assert_eq!(requested, 10);
                assert_eq!(realized, 20.0);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn outputs_above_inputs_is_internal() {
        let err = validate_fee_rate(&tx(10_000), Amount::from_sat(9_000), 1, 0.25).unwrap_err();
        assert!(err.is_internal());
    }
}
