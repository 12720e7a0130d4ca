//! Layered entry plan: how many layers, how big, and where the stop sits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Observed outcome of each layer, used for realized P&L simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerOutcomes {
    /// Trades actually opened per layer (at most the planned count)
    pub opened_trades: Vec<u32>,

    /// Opened trades that reached take-profit per layer
    pub tp_hits: Vec<u32>,
}

/// The trader's intended scale-in plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPlan {
    /// Number of entry layers
    pub num_layers: usize,

    /// Lot size of every individual trade
    pub lot_size_per_trade: Decimal,

    /// USD per pip for a 0.01 lot position
    pub pip_value: Decimal,

    /// Pips between layer 1 and the stop-loss
    pub sl_distance_pips: Decimal,

    /// Pips between the first and the last layer entry
    pub first_to_last_layer_distance_pips: Decimal,

    /// Planned trade count per layer, layer 1 first
    pub trades_per_layer: Vec<u32>,

    /// Take-profit distance in pips, required for simulation
    #[serde(default)]
    pub tp_distance_pips: Option<Decimal>,

    /// Per-layer outcomes; simulation runs only when present
    #[serde(default)]
    pub simulation: Option<LayerOutcomes>,
}

impl StrategyPlan {
    /// Same sizing and geometry with a different trade distribution.
    ///
    /// Simulation inputs are dropped since they are tied to the old layers.
    pub fn with_distribution(&self, trades_per_layer: Vec<u32>) -> Self {
        Self {
            num_layers: trades_per_layer.len(),
            trades_per_layer,
            simulation: None,
            ..self.clone()
        }
    }

    /// Total planned trades across all layers; `None` if the count
    /// does not fit in a `u32`.
    pub fn total_trades(&self) -> Option<u32> {
        self.trades_per_layer
            .iter()
            .try_fold(0u32, |acc, &t| acc.checked_add(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn plan(trades: Vec<u32>) -> StrategyPlan {
        StrategyPlan {
            num_layers: trades.len(),
            lot_size_per_trade: dec!(0.01),
            pip_value: dec!(0.1),
            sl_distance_pips: dec!(50),
            first_to_last_layer_distance_pips: dec!(20),
            trades_per_layer: trades,
            tp_distance_pips: None,
            simulation: None,
        }
    }

    #[test]
    fn test_total_trades() {
        assert_eq!(plan(vec![4, 4, 8]).total_trades(), Some(16));
        assert_eq!(plan(vec![]).total_trades(), Some(0));
        assert_eq!(plan(vec![u32::MAX, 1]).total_trades(), None);
    }

    #[test]
    fn test_with_distribution_drops_simulation() {
        let mut p = plan(vec![1, 1]);
        p.simulation = Some(LayerOutcomes::default());

        let q = p.with_distribution(vec![4, 4, 4]);
        assert_eq!(q.num_layers, 3);
        assert!(q.simulation.is_none());
        assert_eq!(q.sl_distance_pips, p.sl_distance_pips);
    }
}
