//! Greedy, single pass coin selection.
//!
//! UTXOs are consumed in the order they are supplied until they cover the recipients,
//! the fee for the transaction built so far, and a change output of at least
//! `min_change`. A surplus smaller than `min_change` is not given up to fees, more
//! inputs are added instead.

use bitcoin::consensus::encode::VarInt;
use bitcoin::Amount;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::recipient::Recipient;
use crate::wallet::Utxo;
use crate::Network;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionResult {
    /// In the order they were selected.
    pub selected: Vec<Utxo>,
    pub change: Amount,
    pub fee: Amount,
    /// Estimated weight of the final transaction, change output included.
    pub weight: u64,
}

fn varint_len(n: u64) -> u64 {
    VarInt(n).size() as u64
}

fn output_weight(script_len: usize) -> u64 {
    let script_len = script_len as u64;
    OUTPUT_VALUE_WU + (varint_len(script_len) + script_len) * WITNESS_SCALE_FACTOR
}

/// `ceil(weight / 4 * fee_rate)`
fn fee_for_weight(weight: u64, fee_rate: u32) -> u64 {
    (weight * fee_rate as u64).div_ceil(WITNESS_SCALE_FACTOR)
}

/// Weight of everything but the inputs: header, output count, recipients.
fn base_weight(recipients: &[Recipient], network: Network) -> Result<u64> {
    // One more output for change
    let output_count = recipients.len() as u64 + 1;

    let mut weight = TX_VERSION_WU
        + SEGWIT_MARKER_FLAG_WU
        + LOCKTIME_WU
        + INPUT_COUNT_WU
        + varint_len(output_count) * WITNESS_SCALE_FACTOR;

    for recipient in recipients {
        weight += output_weight(recipient.script_len(network)?);
    }
    Ok(weight)
}

pub fn select_coins(
    utxos: &[Utxo],
    recipients: &[Recipient],
    fee_rate: u32,
    min_change: Amount,
    network: Network,
) -> Result<SelectionResult> {
    if fee_rate < 1 {
        return Err(Error::InvalidFeeRate(fee_rate));
    }
    if let Some(zero) = recipients.iter().find(|r| r.amount() == Amount::ZERO) {
        return Err(Error::ZeroRecipientAmount(zero.to_string()));
    }

    let target = recipients
        .iter()
        .try_fold(Amount::ZERO, |acc, r| acc.checked_add(r.amount()))
        .ok_or_else(|| Error::AmountOverflow("recipient amounts".to_string()))?
        .to_sat();
    let mut weight = base_weight(recipients, network)?;

    let mut selected = Vec::new();
    let mut selected_amount = 0u64;

    for utxo in utxos {
        if selected.is_empty() {
            weight += WITNESS_COUNT_WU + output_weight(P2TR_SCRIPT_LEN);
        }
        weight += TR_INPUT_OUTPOINT_WU + TR_WITNESS_DATA_WU;

        selected.push(utxo.clone());
        selected_amount = selected_amount
            .checked_add(utxo.amount.to_sat())
            .ok_or_else(|| Error::AmountOverflow("selected utxo amounts".to_string()))?;

        let fee = fee_for_weight(weight, fee_rate);
        let needed = target
            .checked_add(fee)
            .ok_or_else(|| Error::AmountOverflow("recipient amounts plus fee".to_string()))?;
        if selected_amount > needed {
            let change = selected_amount - needed;
            if change >= min_change.to_sat() {
                log::debug!(
                    "selected {} of {} utxos, {} sat change, {} sat fee for {} WU",
                    selected.len(),
                    utxos.len(),
                    change,
                    fee,
                    weight
                );
                return Ok(SelectionResult {
                    selected,
                    change: Amount::from_sat(change),
                    fee: Amount::from_sat(fee),
                    weight,
                });
            }
        }
    }

    Err(Error::InsufficientFunds {
        available: Amount::from_sat(selected_amount),
        target: Amount::from_sat(target),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::UtxoState;
    use bitcoin::secp256k1::{Secp256k1, SecretKey};
    use sp_address::SilentPaymentAddress;

    const P2WPKH: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    fn utxos(amounts: &[u64]) -> Vec<Utxo> {
        let secp = Secp256k1::new();
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                let (pub_key, _) = SecretKey::from_slice(&[i as u8 + 1; 32])
                    .unwrap()
                    .x_only_public_key(&secp);
                Utxo {
                    txid: [i as u8; 32],
                    vout: 0,
                    amount: Amount::from_sat(*amount),
                    pub_key,
                    priv_key_tweak: [0x02; 32],
                    timestamp: 0,
                    state: UtxoState::Unspent,
                    label: None,
                }
            })
            .collect()
    }

    fn conventional(amount: u64) -> Recipient {
        Recipient::Conventional {
            address: P2WPKH.to_string(),
            amount: Amount::from_sat(amount),
        }
    }

    fn silent_payment(amount: u64) -> Recipient {
        let secp = Secp256k1::new();
        let scan = SecretKey::from_slice(&[0x11; 32]).unwrap().public_key(&secp);
        let spend = SecretKey::from_slice(&[0x22; 32]).unwrap().public_key(&secp);
        Recipient::SilentPayment {
            address: SilentPaymentAddress::new(scan, spend, sp_address::Network::Mainnet, 0)
                .unwrap(),
            amount: Amount::from_sat(amount),
        }
    }

    fn select(
        utxos: &[Utxo],
        recipient: Recipient,
        fee_rate: u32,
        min_change: u64,
    ) -> Result<SelectionResult> {
        select_coins(
            utxos,
            &[recipient],
            fee_rate,
            Amount::from_sat(min_change),
            Network::Mainnet,
        )
    }

    #[test]
    fn single_input_covers_small_payment() {
        let res = select(&utxos(&[20000, 40000, 60000]), conventional(5000), 1, 5000).unwrap();

        assert_eq!(res.selected.len(), 1);
        assert_eq!(res.fee, Amount::from_sat(142));
        assert_eq!(res.change, Amount::from_sat(14858));
        assert_eq!(res.weight, 568);
    }

    #[test]
    fn second_input_rounds_fee_up() {
        let res = select(&utxos(&[20000, 40000, 60000]), conventional(54000), 1, 5000).unwrap();

        assert_eq!(res.selected.len(), 2);
        // 797 WU is 199.25 vB
        assert_eq!(res.weight, 797);
        assert_eq!(res.fee, Amount::from_sat(200));
        assert_eq!(res.change, Amount::from_sat(5800));
    }

    #[test]
    fn higher_fee_rate() {
        let res = select(&utxos(&[20000, 40000, 60000]), conventional(50000), 10, 5000).unwrap();

        assert_eq!(res.selected.len(), 2);
        assert_eq!(res.fee, Amount::from_sat(1993));
        assert_eq!(res.change, Amount::from_sat(8007));
    }

    #[test]
    fn exact_amount_is_insufficient() {
        let err = select(&utxos(&[20000]), conventional(20000), 10, 5000).unwrap_err();

        assert!(matches!(
            err,
            Error::InsufficientFunds { available, target }
                if available == Amount::from_sat(20000) && target == Amount::from_sat(20000)
        ));
    }

    #[test]
    fn silent_payment_output_is_taproot_sized() {
        let res = select(&utxos(&[20000]), silent_payment(10000), 10, 5000).unwrap();

        assert_eq!(res.selected.len(), 1);
        assert_eq!(res.fee, Amount::from_sat(1540));
        assert_eq!(res.change, Amount::from_sat(8460));
    }

    #[test]
    fn surplus_below_min_change_pulls_more_inputs() {
        // 10000 - 5000 - 142 leaves 4858, below the threshold
        let res = select(&utxos(&[10000, 10000]), conventional(5000), 1, 5000).unwrap();
        assert_eq!(res.selected.len(), 2);

        let res = select(&utxos(&[10000, 10000]), conventional(5000), 1, 546).unwrap();
        assert_eq!(res.selected.len(), 1);
    }

    #[test]
    fn selection_follows_supplied_order() {
        let set = utxos(&[60000, 20000]);
        let res = select(&set, conventional(5000), 1, 546).unwrap();

        assert_eq!(res.selected, vec![set[0].clone()]);
    }

    #[test]
    fn rejects_bad_arguments() {
        let set = utxos(&[20000]);

        assert!(matches!(
            select(&set, conventional(1000), 0, 546),
            Err(Error::InvalidFeeRate(0))
        ));
        assert!(matches!(
            select(&set, conventional(0), 1, 546),
            Err(Error::ZeroRecipientAmount(_))
        ));
        assert!(matches!(
            select(&[], conventional(1000), 1, 546),
            Err(Error::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        let half = u64::MAX / 2 + 1;
        let err = select_coins(
            &utxos(&[20000]),
            &[conventional(half), conventional(half)],
            1,
            Amount::from_sat(546),
            Network::Mainnet,
        )
        .unwrap_err();
        assert!(matches!(err, Error::AmountOverflow(_)));

        // First input leaves 58 sat of change, the second one overflows the running total
        let set = utxos(&[u64::MAX - 200, 300]);
        let err = select(&set, conventional(u64::MAX - 400), 1, 546).unwrap_err();
        assert!(matches!(err, Error::AmountOverflow(_)));

        let err = select(&utxos(&[20000]), conventional(u64::MAX - 100), 1, 546).unwrap_err();
        assert!(matches!(err, Error::AmountOverflow(_)));
    }

    #[test]
    fn result_balances() {
        let set = utxos(&[1500, 7000, 3300, 90000, 12000]);
        for (amount, fee_rate) in [(1000, 1), (8000, 3), (20000, 7), (50000, 25)] {
            let res = select(&set, conventional(amount), fee_rate, 546).unwrap();
            let selected: u64 = res.selected.iter().map(|u| u.amount.to_sat()).sum();

            assert!(res.change >= Amount::from_sat(546));
            assert_eq!(
                selected,
                amount + res.fee.to_sat() + res.change.to_sat(),
                "amount {} at {} sat/vB",
                amount,
                fee_rate
            );
            assert_eq!(res.fee.to_sat(), fee_for_weight(res.weight, fee_rate));
        }
    }
}
