use bitcoin::Amount;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FEE_RATE_TOLERANCE, DEFAULT_MIN_CHANGE};
use crate::Network;

/// Settings threaded through a single send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendConfig {
    pub network: Network,
    /// Surplus below this amount is not accepted as change; selection keeps adding inputs.
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub min_change_amount: Amount,
    /// Maximum distance between requested and realized fee rate, in sat/vB.
    pub fee_rate_tolerance: f64,
}

impl SendConfig {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            ..Default::default()
        }
    }

    pub fn with_min_change_amount(mut self, amount: Amount) -> Self {
        self.min_change_amount = amount;
        self
    }

    pub fn with_fee_rate_tolerance(mut self, tolerance: f64) -> Self {
        self.fee_rate_tolerance = tolerance;
        self
    }
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            min_change_amount: DEFAULT_MIN_CHANGE,
            fee_rate_tolerance: DEFAULT_FEE_RATE_TOLERANCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: SendConfig = serde_json::from_str(r#"{"network":"signet"}"#).unwrap();

        assert_eq!(config.network, Network::Signet);
        assert_eq!(config.min_change_amount, Amount::from_sat(546));
        assert_eq!(config.fee_rate_tolerance, 0.25);
    }

    #[test]
    fn min_change_is_read_as_sats() {
        let config: SendConfig =
            serde_json::from_str(r#"{"network":"regtest","min_change_amount":5000}"#).unwrap();

        assert_eq!(config.min_change_amount, Amount::from_sat(5000));
        assert_eq!(
            SendConfig::new(Network::Regtest).with_min_change_amount(Amount::from_sat(5000)),
            config
        );
    }
}
