//! Preset layer/trade distributions offered for side-by-side comparison.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shape of a preset trade distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDistribution {
    /// Same trade count on every layer
    Normal,
    /// Same count on all but the final two layers, which get double
    Effective,
}

impl TradeDistribution {
    pub fn label(&self) -> &'static str {
        match self {
            TradeDistribution::Normal => "Normal",
            TradeDistribution::Effective => "Effective",
        }
    }

    /// Expand into a per-layer trade count sequence.
    pub fn trades(&self, layers: usize, base_trades: u32) -> Vec<u32> {
        match self {
            TradeDistribution::Normal => vec![base_trades; layers],
            TradeDistribution::Effective => (0..layers)
                .map(|i| {
                    if i + 2 >= layers {
                        base_trades * 2
                    } else {
                        base_trades
                    }
                })
                .collect(),
        }
    }
}

impl fmt::Display for TradeDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of the comparison catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigTemplate {
    pub layers: usize,
    pub distribution: TradeDistribution,
    pub trades_distribution: Vec<u32>,
}

impl ConfigTemplate {
    pub fn new(layers: usize, distribution: TradeDistribution, base_trades: u32) -> Self {
        Self {
            layers,
            distribution,
            trades_distribution: distribution.trades(layers, base_trades),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distributions() {
        assert_eq!(TradeDistribution::Normal.trades(6, 4), vec![4, 4, 4, 4, 4, 4]);
        assert_eq!(
            TradeDistribution::Effective.trades(6, 4),
            vec![4, 4, 4, 4, 8, 8]
        );
        assert_eq!(
            TradeDistribution::Effective.trades(8, 4),
            vec![4, 4, 4, 4, 4, 4, 8, 8]
        );
        assert_eq!(TradeDistribution::Effective.trades(1, 4), vec![8]);
    }
}
