//! Layer geometry: distance from each layer entry to the shared stop-loss.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Evenly spaced layers between the first and the last entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerGeometry {
    /// Pips between two consecutive layers
    pub price_gap_pips: Decimal,

    /// Raw distance to stop per layer, layer 1 first. Values go negative
    /// once a layer lies beyond the stop; callers clamp as needed.
    pub distance_to_stop_pips: Vec<Decimal>,
}

impl LayerGeometry {
    /// Layer 1 sits `sl_distance_pips` from the stop and every further layer
    /// is one price gap closer to it.
    pub fn compute(
        num_layers: usize,
        first_to_last_layer_distance_pips: Decimal,
        sl_distance_pips: Decimal,
    ) -> Self {
        let price_gap_pips = if num_layers > 1 {
            first_to_last_layer_distance_pips / Decimal::from(num_layers - 1)
        } else {
            Decimal::ZERO
        };

        let distance_to_stop_pips = (0..num_layers)
            .map(|i| sl_distance_pips - Decimal::from(i) * price_gap_pips)
            .collect();

        Self {
            price_gap_pips,
            distance_to_stop_pips,
        }
    }

    pub fn num_layers(&self) -> usize {
        self.distance_to_stop_pips.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_even_spacing() {
        let g = LayerGeometry::compute(6, dec!(40), dec!(80));

        assert_eq!(g.price_gap_pips, dec!(8));
        assert_eq!(
            g.distance_to_stop_pips,
            vec![dec!(80), dec!(72), dec!(64), dec!(56), dec!(48), dec!(40)]
        );
    }

    #[test]
    fn test_single_layer_has_no_gap() {
        let g = LayerGeometry::compute(1, dec!(40), dec!(80));

        assert_eq!(g.price_gap_pips, Decimal::ZERO);
        assert_eq!(g.distance_to_stop_pips, vec![dec!(80)]);
    }

    #[test]
    fn test_layers_past_stop_go_negative() {
        // Gap of 20 pips, stop only 30 pips from layer 1
        let g = LayerGeometry::compute(4, dec!(60), dec!(30));

        assert_eq!(
            g.distance_to_stop_pips,
            vec![dec!(30), dec!(10), dec!(-10), dec!(-30)]
        );
    }
}
