//! Exposure: per-trade loss at the stop, worst-case loss, total lots, and
//! realized P&L of simulated layer outcomes.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{ExposureResult, LayerMetrics, LayerOutcomes, SimulationResult, StrategyPlan};

use super::LayerGeometry;

/// Turns layer geometry and trade counts into money figures (USD).
pub struct ExposureCalculator {
    baseline_lot: Decimal,
}

impl ExposureCalculator {
    /// `baseline_lot` is the position size the pip value is quoted for.
    pub fn new(baseline_lot: Decimal) -> Self {
        Self { baseline_lot }
    }

    /// Compute per-layer metrics and aggregate exposure for a plan.
    ///
    /// Layers beyond the stop lose nothing: their distance is clamped to zero
    /// before pricing, so a loss is never reported as a gain.
    pub fn compute(
        &self,
        geometry: &LayerGeometry,
        plan: &StrategyPlan,
    ) -> EngineResult<(Vec<LayerMetrics>, ExposureResult)> {
        if plan.lot_size_per_trade <= Decimal::ZERO {
            return Err(EngineError::invalid(
                "lot_size_per_trade",
                format!("must be positive, got {}", plan.lot_size_per_trade),
            ));
        }
        if plan.pip_value <= Decimal::ZERO {
            return Err(EngineError::invalid(
                "pip_value",
                format!("must be positive, got {}", plan.pip_value),
            ));
        }
        if self.baseline_lot <= Decimal::ZERO {
            return Err(EngineError::invalid(
                "baseline_lot",
                format!("must be positive, got {}", self.baseline_lot),
            ));
        }
        if plan.trades_per_layer.len() != geometry.num_layers() {
            return Err(EngineError::invalid(
                "trades_per_layer",
                format!(
                    "expected {} entries, got {}",
                    geometry.num_layers(),
                    plan.trades_per_layer.len()
                ),
            ));
        }

        let scale = plan.lot_size_per_trade / self.baseline_lot;
        let usd_per_pip = plan.pip_value * scale;

        let mut layers: Vec<LayerMetrics> = geometry
            .distance_to_stop_pips
            .iter()
            .zip(&plan.trades_per_layer)
            .enumerate()
            .map(|(i, (&distance, &trades))| {
                let loss_per_trade_usd = distance.max(Decimal::ZERO) * usd_per_pip;
                LayerMetrics {
                    layer: i + 1,
                    distance_to_stop_pips: distance,
                    loss_per_trade_usd,
                    planned_trades: trades,
                    layer_loss_usd: loss_per_trade_usd * Decimal::from(trades),
                    opened_trades: None,
                    tp_hits: None,
                    sl_hits: None,
                }
            })
            .collect();

        let total_trades = plan
            .total_trades()
            .ok_or_else(|| EngineError::invalid("trades_per_layer", "total trade count overflows"))?;
        let total_lots = Decimal::from(total_trades) * plan.lot_size_per_trade;
        let theoretical_max_loss_usd = layers.iter().map(|l| l.layer_loss_usd).sum();

        let simulation = match &plan.simulation {
            Some(outcomes) => {
                let tp_distance = plan.tp_distance_pips.ok_or_else(|| {
                    EngineError::invalid("tp_distance_pips", "required when simulating outcomes")
                })?;
                let profit_per_trade_usd = tp_distance * usd_per_pip;
                Some(Self::simulate(&mut layers, outcomes, profit_per_trade_usd)?)
            }
            None => None,
        };

        debug!(
            layers = layers.len(),
            total_trades = total_trades,
            total_lots = %total_lots,
            max_loss_usd = %theoretical_max_loss_usd,
            "Exposure computed"
        );

        Ok((
            layers,
            ExposureResult {
                total_trades,
                total_lots,
                theoretical_max_loss_usd,
                simulation,
            },
        ))
    }

    /// Realized P&L: take-profits earn the uniform TP distance, the rest of
    /// the opened trades lose their layer's stop distance.
    fn simulate(
        layers: &mut [LayerMetrics],
        outcomes: &LayerOutcomes,
        profit_per_trade_usd: Decimal,
    ) -> EngineResult<SimulationResult> {
        if outcomes.opened_trades.len() != layers.len() {
            return Err(EngineError::invalid(
                "opened_trades",
                format!("expected {} entries, got {}", layers.len(), outcomes.opened_trades.len()),
            ));
        }
        if outcomes.tp_hits.len() != layers.len() {
            return Err(EngineError::invalid(
                "tp_hits",
                format!("expected {} entries, got {}", layers.len(), outcomes.tp_hits.len()),
            ));
        }

        let mut total_profit = Decimal::ZERO;
        let mut total_loss = Decimal::ZERO;
        let mut closed: u32 = 0;

        for ((layer, &opened), &tp_hits) in layers
            .iter_mut()
            .zip(&outcomes.opened_trades)
            .zip(&outcomes.tp_hits)
        {
            if opened > layer.planned_trades {
                return Err(EngineError::invalid(
                    "opened_trades",
                    format!(
                        "layer {}: {} opened exceeds {} planned",
                        layer.layer, opened, layer.planned_trades
                    ),
                ));
            }
            if tp_hits > opened {
                return Err(EngineError::invalid(
                    "tp_hits",
                    format!("layer {}: {} TP hits exceed {} opened", layer.layer, tp_hits, opened),
                ));
            }

            let sl_hits = opened - tp_hits;
            total_profit += Decimal::from(tp_hits) * profit_per_trade_usd;
            total_loss += Decimal::from(sl_hits) * layer.loss_per_trade_usd;
            closed = closed.checked_add(opened).ok_or_else(|| {
                EngineError::invalid("opened_trades", "total opened count overflows")
            })?;

            layer.opened_trades = Some(opened);
            layer.tp_hits = Some(tp_hits);
            layer.sl_hits = Some(sl_hits);
        }

        let net = total_profit - total_loss;
        let avg = if closed > 0 {
            net / Decimal::from(closed)
        } else {
            Decimal::ZERO
        };

        Ok(SimulationResult {
            profit_per_trade_usd,
            total_realized_profit_usd: total_profit,
            total_realized_loss_usd: total_loss,
            net_realized_pl_usd: net,
            closed_trades_count: closed,
            avg_profit_per_closed_trade_usd: avg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn plan(trades: Vec<u32>) -> StrategyPlan {
        StrategyPlan {
            num_layers: trades.len(),
            lot_size_per_trade: dec!(0.02),
            pip_value: dec!(0.1),
            sl_distance_pips: dec!(80),
            first_to_last_layer_distance_pips: dec!(40),
            trades_per_layer: trades,
            tp_distance_pips: None,
            simulation: None,
        }
    }

    fn compute(plan: &StrategyPlan) -> EngineResult<(Vec<LayerMetrics>, ExposureResult)> {
        let geometry = LayerGeometry::compute(
            plan.num_layers,
            plan.first_to_last_layer_distance_pips,
            plan.sl_distance_pips,
        );
        ExposureCalculator::new(dec!(0.01)).compute(&geometry, plan)
    }

    #[test]
    fn test_scenario_losses() {
        let (layers, exposure) = compute(&plan(vec![4, 4, 4, 4, 8, 8])).unwrap();

        let losses: Vec<_> = layers.iter().map(|l| l.loss_per_trade_usd).collect();
        assert_eq!(
            losses,
            vec![dec!(16), dec!(14.4), dec!(12.8), dec!(11.2), dec!(9.6), dec!(8.0)]
        );
        assert_eq!(exposure.theoretical_max_loss_usd, dec!(358.4));
        assert_eq!(exposure.total_trades, 32);
        assert_eq!(exposure.total_lots, dec!(0.64));
        assert!(exposure.simulation.is_none());
    }

    #[test]
    fn test_aggregate_matches_layer_sum() {
        let p = StrategyPlan {
            sl_distance_pips: dec!(37),
            first_to_last_layer_distance_pips: dec!(50),
            lot_size_per_trade: dec!(0.07),
            ..plan(vec![3, 1, 0, 7, 2, 9, 5])
        };
        let (layers, exposure) = compute(&p).unwrap();

        let sum: Decimal = layers
            .iter()
            .map(|l| l.loss_per_trade_usd * Decimal::from(l.planned_trades))
            .sum();
        assert_eq!(exposure.theoretical_max_loss_usd, sum);
    }

    #[test]
    fn test_negative_distance_clamped_to_zero_loss() {
        let p = StrategyPlan {
            sl_distance_pips: dec!(10),
            ..plan(vec![1, 1, 1, 1, 1, 1])
        };
        let (layers, _) = compute(&p).unwrap();

        for l in &layers {
            if l.distance_to_stop_pips < Decimal::ZERO {
                assert_eq!(l.loss_per_trade_usd, Decimal::ZERO);
            }
        }
        assert!(layers[5].distance_to_stop_pips < Decimal::ZERO);
    }

    #[test]
    fn test_rejects_non_positive_sizing() {
        let p = StrategyPlan {
            lot_size_per_trade: Decimal::ZERO,
            ..plan(vec![4])
        };
        assert_eq!(compute(&p).unwrap_err().field(), "lot_size_per_trade");

        let p = StrategyPlan {
            pip_value: dec!(-0.1),
            ..plan(vec![4])
        };
        assert_eq!(compute(&p).unwrap_err().field(), "pip_value");
    }

    #[test]
    fn test_total_trade_overflow_rejected() {
        let p = plan(vec![u32::MAX, 1]);
        assert_eq!(compute(&p).unwrap_err().field(), "trades_per_layer");

        let (_, exposure) = compute(&plan(vec![u32::MAX, 0])).unwrap();
        assert_eq!(exposure.total_trades, u32::MAX);
    }

    #[test]
    fn test_simulation() {
        let p = StrategyPlan {
            tp_distance_pips: Some(dec!(20)),
            simulation: Some(LayerOutcomes {
                opened_trades: vec![4, 4, 2, 0, 0, 0],
                tp_hits: vec![4, 3, 0, 0, 0, 0],
            }),
            ..plan(vec![4, 4, 4, 4, 8, 8])
        };
        let (layers, exposure) = compute(&p).unwrap();
        let sim = exposure.simulation.unwrap();

        // 20 pips * 0.1 * 2 = 4 USD per take-profit
        assert_eq!(sim.profit_per_trade_usd, dec!(4));
        assert_eq!(sim.total_realized_profit_usd, dec!(28));
        // 1 SL on layer 2 (14.4) + 2 SL on layer 3 (12.8 each)
        assert_eq!(sim.total_realized_loss_usd, dec!(40.0));
        assert_eq!(sim.net_realized_pl_usd, dec!(-12.0));
        assert_eq!(sim.closed_trades_count, 10);
        assert_eq!(sim.avg_profit_per_closed_trade_usd, dec!(-1.2));
        assert_eq!(layers[1].sl_hits, Some(1));
        assert_eq!(layers[2].sl_hits, Some(2));
    }

    #[test]
    fn test_simulation_without_closed_trades() {
        let p = StrategyPlan {
            tp_distance_pips: Some(dec!(20)),
            simulation: Some(LayerOutcomes {
                opened_trades: vec![0, 0],
                tp_hits: vec![0, 0],
            }),
            ..plan(vec![4, 4])
        };
        let sim = compute(&p).unwrap().1.simulation.unwrap();

        assert_eq!(sim.closed_trades_count, 0);
        assert_eq!(sim.avg_profit_per_closed_trade_usd, Decimal::ZERO);
    }

    #[test]
    fn test_simulation_bounds_rejected() {
        let over_opened = StrategyPlan {
            tp_distance_pips: Some(dec!(20)),
            simulation: Some(LayerOutcomes {
                opened_trades: vec![5, 0],
                tp_hits: vec![0, 0],
            }),
            ..plan(vec![4, 4])
        };
        assert_eq!(compute(&over_opened).unwrap_err().field(), "opened_trades");

        let over_tp = StrategyPlan {
            tp_distance_pips: Some(dec!(20)),
            simulation: Some(LayerOutcomes {
                opened_trades: vec![2, 0],
                tp_hits: vec![3, 0],
            }),
            ..plan(vec![4, 4])
        };
        assert_eq!(compute(&over_tp).unwrap_err().field(), "tp_hits");

        let no_tp = StrategyPlan {
            simulation: Some(LayerOutcomes {
                opened_trades: vec![1, 0],
                tp_hits: vec![0, 0],
            }),
            ..plan(vec![4, 4])
        };
        assert_eq!(compute(&no_tp).unwrap_err().field(), "tp_distance_pips");
    }
}
