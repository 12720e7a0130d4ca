//! Risk policy configuration.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::{ConfigTemplate, TradeDistribution};

/// Constants of the expected-profit heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfitHeuristic {
    /// Expected profit in EUR of the reference plan
    pub base_profit_eur: Decimal,

    /// Trade count of the reference plan (6 layers, 4/4/4/4/8/8)
    pub baseline_trades: u32,

    /// Layer count of the reference plan
    pub reference_layers: u32,

    /// Complexity added per layer above the reference
    pub per_layer_factor: Decimal,

    /// Price gap (pips) that adds one `gap_factor` of complexity
    pub gap_divisor_pips: Decimal,

    pub gap_factor: Decimal,

    /// Lower bound of the complexity factor
    pub min_complexity: Decimal,
}

impl Default for ProfitHeuristic {
    fn default() -> Self {
        Self {
            base_profit_eur: dec!(100),
            baseline_trades: 32,
            reference_layers: 6,
            per_layer_factor: dec!(0.05),
            gap_divisor_pips: dec!(30),
            gap_factor: dec!(0.1),
            min_complexity: dec!(0.5),
        }
    }
}

/// Policy anchors and thresholds used by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    /// Balance at which the maximum allowed risk applies
    pub start_balance: Decimal,

    /// Balance at which the minimum allowed risk applies
    pub end_balance: Decimal,

    /// Allowed risk (fraction) at `start_balance` and below
    pub max_risk_fraction: Decimal,

    /// Allowed risk (fraction) at `end_balance` and above
    pub min_risk_fraction: Decimal,

    /// Share of the allowed risk above which a plan is "approaching limit"
    pub risk_warning_fraction: Decimal,

    /// Margin usage (%) above which margin is too high
    pub margin_too_high_pct: Decimal,

    /// Margin usage (%) above which margin is high
    pub margin_high_pct: Decimal,

    /// Margin usage (%) above which margin is moderate
    pub margin_moderate_pct: Decimal,

    /// Troy ounces per standard lot
    pub contract_size_oz: Decimal,

    /// Lot size the pip value is quoted for
    pub baseline_lot: Decimal,

    /// Upper bound on the number of layers in a plan
    pub max_layers: usize,

    /// Trade count per layer used when building the preset catalogue
    pub catalogue_base_trades: u32,

    /// Layer counts of the preset catalogue
    pub catalogue_layers: Vec<usize>,

    pub profit: ProfitHeuristic,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            start_balance: dec!(1000),
            end_balance: dec!(150000),
            max_risk_fraction: dec!(0.10),  // 10% for small accounts
            min_risk_fraction: dec!(0.025), // 2.5% for large accounts
            risk_warning_fraction: dec!(0.75),
            margin_too_high_pct: dec!(50),
            margin_high_pct: dec!(30),
            margin_moderate_pct: dec!(10),
            contract_size_oz: dec!(100), // XAUUSD CFD standard lot
            baseline_lot: dec!(0.01),
            max_layers: 16,
            catalogue_base_trades: 4,
            catalogue_layers: vec![6, 7, 8],
            profit: ProfitHeuristic::default(),
        }
    }
}

impl RiskPolicy {
    /// Load a policy from a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse policy file {}", path.display()))
    }

    /// Preset templates: every catalogue layer count in Normal and Effective form.
    pub fn catalogue(&self) -> Vec<ConfigTemplate> {
        self.catalogue_layers
            .iter()
            .flat_map(|&layers| {
                [TradeDistribution::Normal, TradeDistribution::Effective]
                    .into_iter()
                    .map(move |d| ConfigTemplate::new(layers, d, self.catalogue_base_trades))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalogue() {
        let catalogue = RiskPolicy::default().catalogue();

        assert_eq!(catalogue.len(), 6);
        assert_eq!(catalogue[0].layers, 6);
        assert_eq!(catalogue[0].distribution, TradeDistribution::Normal);
        assert_eq!(catalogue[1].trades_distribution, vec![4, 4, 4, 4, 8, 8]);
        assert_eq!(catalogue[5].layers, 8);
        assert_eq!(catalogue[5].distribution, TradeDistribution::Effective);
    }

    #[test]
    fn test_partial_policy_json() {
        let policy: RiskPolicy =
            serde_json::from_str(r#"{"margin_too_high_pct": "60", "catalogue_layers": [5]}"#)
                .unwrap();

        assert_eq!(policy.margin_too_high_pct, dec!(60));
        assert_eq!(policy.margin_high_pct, dec!(30));
        assert_eq!(policy.catalogue().len(), 2);
        assert_eq!(policy.profit, ProfitHeuristic::default());
    }
}
