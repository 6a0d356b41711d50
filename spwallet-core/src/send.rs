//! Building and signing a payment from a wallet's UTXOs.

use bitcoin::{Amount, Transaction, Txid};

use crate::coin_selector::select_coins;
use crate::config::SendConfig;
use crate::error::{Error, Result};
use crate::recipient::Recipient;
use crate::resolver::resolve;
use crate::tx::{build_unsigned_tx, sign_transaction, validate_fee_rate, Vin};
use crate::wallet::{Utxo, Wallet};

/// A signed transaction, ready for broadcast.
///
/// UTXO records are left untouched. Marking [`SendOutcome::selected`] as spent and
/// tracking the change output is up to the caller.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub tx: Transaction,
    pub raw_tx: Vec<u8>,
    pub txid: Txid,
    /// The UTXOs consumed by `tx`.
    pub selected: Vec<Utxo>,
    /// Zero when the transaction has no change output.
    pub change: Amount,
    pub fee: Amount,
    /// Realized fee rate, sat/vB.
    pub fee_rate: f64,
}

impl SendOutcome {
    pub fn raw_tx_hex(&self) -> String {
        hex::encode(&self.raw_tx)
    }
}

/// Pay `recipients` from the `unspent` entries of `utxos` at `fee_rate` sat/vB.
///
/// UTXOs are considered in the order given. Any change goes to the wallet's change
/// label as a silent payment output.
pub fn send_to_recipients(
    wallet: &Wallet,
    utxos: &[Utxo],
    recipients: Vec<Recipient>,
    fee_rate: u32,
    config: &SendConfig,
) -> Result<SendOutcome> {
    if config.network != wallet.network {
        return Err(Error::InternalInconsistency(format!(
            "send configured for {} but wallet is on {}",
            config.network, wallet.network
        )));
    }

    let spendable: Vec<Utxo> = utxos.iter().filter(|u| u.is_spendable()).cloned().collect();
    log::debug!(
        "{} of {} utxos spendable, paying {} recipients",
        spendable.len(),
        utxos.len(),
        recipients.len()
    );

    let selection = select_coins(
        &spendable,
        &recipients,
        fee_rate,
        config.min_change_amount,
        config.network,
    )?;
    log::info!(
        "selected {} inputs, change {}, estimated fee {}",
        selection.selected.len(),
        selection.change,
        selection.fee
    );

    let vins = selection
        .selected
        .iter()
        .map(|utxo| Vin::from_utxo(utxo, &wallet.spend_secret))
        .collect::<Result<Vec<Vin>>>()?;
    let input_total: Amount = vins.iter().map(|vin| vin.amount).sum();

    let mut recipients = recipients;
    if selection.change > Amount::ZERO {
        recipients.push(Recipient::SilentPayment {
            address: wallet.change_address()?,
            amount: selection.change,
        });
    }

    let recipients = resolve(recipients, &vins, config.network)?;
    if let Some(bad) = recipients
        .iter()
        .find(|r| !r.is_resolved() || r.amount() == Amount::ZERO)
    {
        return Err(Error::InternalInconsistency(format!(
            "recipient {} not ready for assembly",
            bad
        )));
    }

    let unsigned = build_unsigned_tx(&vins, &recipients)?;
    let tx = sign_transaction(unsigned, &vins)?;
    let realized = validate_fee_rate(&tx, input_total, fee_rate, config.fee_rate_tolerance)?;

    let txid = tx.compute_txid();
    log::info!("signed {} at {:.2} sat/vB ({} vB)", txid, realized, tx.vsize());

    let output_total: Amount = tx.output.iter().map(|o| o.value).sum();
    Ok(SendOutcome {
        raw_tx: bitcoin::consensus::encode::serialize(&tx),
        txid,
        selected: selection.selected,
        change: selection.change,
        fee: input_total - output_total,
        fee_rate: realized,
        tx,
    })
}
