//! Engine facade: runs geometry → exposure → conversion → risk/margin for a
//! plan, and the same chain over the preset catalogue.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AccountContext, Evaluation, ExposureResult, LayerMetrics, RateSnapshot, RiskMarginResult,
    StrategyPlan,
};

use super::{profit, CurrencyConverter, ExposureCalculator, LayerGeometry, RiskAndMarginEvaluator, RiskPolicy};

/// Everything needed for one evaluation, as accepted over JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub plan: StrategyPlan,
    pub account: AccountContext,
    /// Omitted rates fall back to the conventional defaults
    #[serde(default)]
    pub rates: Option<RateSnapshot>,
}

/// Intermediate figures shared by single-plan and catalogue evaluation.
pub(super) struct Assessment {
    pub geometry: LayerGeometry,
    pub layers: Vec<LayerMetrics>,
    pub exposure: ExposureResult,
    pub risk: RiskMarginResult,
}

/// Stateless risk engine. Every call is a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    policy: RiskPolicy,
}

impl Engine {
    pub fn new(policy: RiskPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Evaluate a plan for an account under the given market rates.
    pub fn evaluate(
        &self,
        plan: &StrategyPlan,
        account: &AccountContext,
        rates: &RateSnapshot,
    ) -> EngineResult<Evaluation> {
        let converter =
            CurrencyConverter::new(account.currency, rates, account.effective_fx_override());
        let Assessment {
            geometry,
            layers,
            exposure,
            risk,
        } = self.assess(plan, account, rates, &converter)?;

        let profit_estimate = profit::estimate(
            &self.policy.profit,
            self.policy.baseline_lot,
            plan,
            geometry.price_gap_pips,
            &converter,
        );

        let mut conversion_degraded = risk.conversion_degraded || profit_estimate.degraded;
        let net_realized_pl_account_ccy = exposure.simulation.as_ref().map(|sim| {
            let net = converter.usd_to_account(sim.net_realized_pl_usd);
            conversion_degraded |= net.degraded;
            net.amount
        });

        let mut warnings = Vec::new();
        if conversion_degraded {
            let pair = account.currency.pair_name().unwrap_or("EURUSD");
            warnings.push(format!(
                "{} rate unavailable: some figures are shown unconverted",
                pair
            ));
        }
        if risk.gold_price_defaulted {
            warnings.push(format!(
                "Gold price unavailable: margin computed at the default XAUUSD ${}",
                risk.gold_price_usd
            ));
        }
        if layers.iter().any(|l| l.distance_to_stop_pips < Decimal::ZERO) {
            warnings.push(
                "Some layers lie beyond the stop-loss and are counted with zero loss".to_string(),
            );
        }

        debug!(
            currency = %account.currency,
            max_loss_usd = %exposure.theoretical_max_loss_usd,
            risk_status = ?risk.risk_status,
            margin_status = ?risk.margin_status,
            degraded = conversion_degraded,
            "Plan evaluated"
        );

        Ok(Evaluation {
            currency: account.currency,
            balance: account.balance,
            leverage: account.leverage,
            price_gap_pips: geometry.price_gap_pips,
            layers,
            exposure,
            risk,
            profit_estimate,
            net_realized_pl_account_ccy,
            conversion_degraded,
            warnings,
            rates_captured_at: rates.captured_at,
        })
    }

    /// Run a request decoded from JSON.
    pub fn evaluate_request(&self, request: &EvaluationRequest) -> EngineResult<Evaluation> {
        match &request.rates {
            Some(rates) => self.evaluate(&request.plan, &request.account, rates),
            None => self.evaluate(&request.plan, &request.account, &RateSnapshot::fallback()),
        }
    }

    /// Validate the plan and compute geometry, exposure and risk/margin.
    pub(super) fn assess(
        &self,
        plan: &StrategyPlan,
        account: &AccountContext,
        rates: &RateSnapshot,
        converter: &CurrencyConverter<'_>,
    ) -> EngineResult<Assessment> {
        self.validate(plan)?;

        let geometry = LayerGeometry::compute(
            plan.num_layers,
            plan.first_to_last_layer_distance_pips,
            plan.sl_distance_pips,
        );
        let (layers, exposure) =
            ExposureCalculator::new(self.policy.baseline_lot).compute(&geometry, plan)?;

        let (gold_price_usd, gold_price_defaulted) =
            match account.effective_gold_override().or_else(|| rates.gold_price()) {
                Some(price) => (price, false),
                None => {
                    let default = RateSnapshot::fallback().gold_price_usd;
                    warn!(default = %default, "No gold price available, using default for margin");
                    (default, true)
                }
            };
        let mut risk = RiskAndMarginEvaluator::new(&self.policy).evaluate(
            &exposure,
            account,
            converter,
            gold_price_usd,
        )?;
        risk.gold_price_defaulted = gold_price_defaulted;

        if risk.conversion_degraded {
            warn!(currency = %account.currency, "Risk figures computed with degraded conversion");
        }

        Ok(Assessment {
            geometry,
            layers,
            exposure,
            risk,
        })
    }

    fn validate(&self, plan: &StrategyPlan) -> EngineResult<()> {
        if plan.num_layers == 0 || plan.num_layers > self.policy.max_layers {
            return Err(EngineError::invalid(
                "num_layers",
                format!(
                    "must be between 1 and {}, got {}",
                    self.policy.max_layers, plan.num_layers
                ),
            ));
        }
        if plan.trades_per_layer.len() != plan.num_layers {
            return Err(EngineError::invalid(
                "trades_per_layer",
                format!(
                    "has {} entries but num_layers is {}",
                    plan.trades_per_layer.len(),
                    plan.num_layers
                ),
            ));
        }
        if plan.sl_distance_pips < Decimal::ZERO {
            return Err(EngineError::invalid(
                "sl_distance_pips",
                format!("must not be negative, got {}", plan.sl_distance_pips),
            ));
        }
        if plan.first_to_last_layer_distance_pips < Decimal::ZERO {
            return Err(EngineError::invalid(
                "first_to_last_layer_distance_pips",
                format!(
                    "must not be negative, got {}",
                    plan.first_to_last_layer_distance_pips
                ),
            ));
        }
        if let Some(tp) = plan.tp_distance_pips {
            if tp < Decimal::ZERO {
                return Err(EngineError::invalid(
                    "tp_distance_pips",
                    format!("must not be negative, got {}", tp),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, LayerOutcomes, Leverage, RiskStatus};
    use rust_decimal_macros::dec;

    fn scenario_plan() -> StrategyPlan {
        StrategyPlan {
            num_layers: 6,
            lot_size_per_trade: dec!(0.02),
            pip_value: dec!(0.1),
            sl_distance_pips: dec!(80),
            first_to_last_layer_distance_pips: dec!(40),
            trades_per_layer: vec![4, 4, 4, 4, 8, 8],
            tp_distance_pips: None,
            simulation: None,
        }
    }

    fn account(balance: Decimal, currency: Currency) -> AccountContext {
        AccountContext::new(balance, currency, Leverage::new(500).unwrap())
    }

    fn close(a: Decimal, b: Decimal) -> bool {
        (a - b).abs() < dec!(0.001)
    }

    #[test]
    fn test_scenario_usd_account() {
        let engine = Engine::default();
        let e = engine
            .evaluate(&scenario_plan(), &account(dec!(4500), Currency::Usd), &RateSnapshot::fallback())
            .unwrap();

        assert_eq!(e.price_gap_pips, dec!(8));
        let distances: Vec<_> = e.layers.iter().map(|l| l.distance_to_stop_pips).collect();
        assert_eq!(
            distances,
            vec![dec!(80), dec!(72), dec!(64), dec!(56), dec!(48), dec!(40)]
        );
        assert_eq!(e.exposure.theoretical_max_loss_usd, dec!(358.4));
        assert_eq!(e.risk.total_loss_account_ccy, dec!(358.4));
        assert!(close(e.risk.actual_risk_pct, dec!(7.964)));
        assert!(close(e.risk.allowed_risk_pct, dec!(9.824)));
        assert_eq!(e.risk.risk_status, RiskStatus::ApproachingLimit);
        assert!(!e.conversion_degraded);
        assert!(e.warnings.is_empty());
    }

    #[test]
    fn test_scenario_cad_account() {
        let engine = Engine::default();
        let mut rates = RateSnapshot::fallback();
        rates.usd_cad = dec!(1.35);

        let e = engine
            .evaluate(&scenario_plan(), &account(dec!(4500), Currency::Cad), &rates)
            .unwrap();

        assert_eq!(e.risk.total_loss_account_ccy, dec!(483.84));
    }

    #[test]
    fn test_scenario_zero_balance() {
        let engine = Engine::default();
        let e = engine
            .evaluate(&scenario_plan(), &account(Decimal::ZERO, Currency::Usd), &RateSnapshot::fallback())
            .unwrap();

        assert_eq!(e.risk.actual_risk_pct, Decimal::ZERO);
        assert_eq!(e.risk.margin_usage_pct, Decimal::ZERO);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let engine = Engine::default();
        let mut acc = account(dec!(4500), Currency::Eur);
        acc.fx_override = Some(dec!(1.12));
        acc.gold_price_override = Some(dec!(2500));

        let e = engine
            .evaluate(&scenario_plan(), &acc, &RateSnapshot::fallback())
            .unwrap();

        assert_eq!(e.risk.total_loss_account_ccy, dec!(320));
        assert_eq!(e.risk.gold_price_usd, dec!(2500));
        // 0.64 * 100 * 2500 / 500 = 320 USD
        assert_eq!(e.risk.margin_required_usd, dec!(320));
    }

    #[test]
    fn test_degraded_conversion_still_evaluates() {
        let engine = Engine::default();
        let mut rates = RateSnapshot::fallback();
        rates.usd_jpy = Decimal::ZERO;

        let e = engine
            .evaluate(&scenario_plan(), &account(dec!(500000), Currency::Jpy), &rates)
            .unwrap();

        assert!(e.conversion_degraded);
        assert!(e.risk.conversion_degraded);
        assert_eq!(e.risk.total_loss_account_ccy, dec!(358.4));
        assert_eq!(e.warnings.len(), 1);
    }

    #[test]
    fn test_invalid_plans_rejected() {
        let engine = Engine::default();
        let acc = account(dec!(4500), Currency::Usd);
        let rates = RateSnapshot::fallback();

        let mismatched = StrategyPlan {
            num_layers: 5,
            ..scenario_plan()
        };
        assert_eq!(
            engine.evaluate(&mismatched, &acc, &rates).unwrap_err().field(),
            "trades_per_layer"
        );

        let too_many = scenario_plan().with_distribution(vec![1; 17]);
        assert_eq!(
            engine.evaluate(&too_many, &acc, &rates).unwrap_err().field(),
            "num_layers"
        );

        let negative_sl = StrategyPlan {
            sl_distance_pips: dec!(-5),
            ..scenario_plan()
        };
        assert_eq!(
            engine.evaluate(&negative_sl, &acc, &rates).unwrap_err().field(),
            "sl_distance_pips"
        );
    }

    #[test]
    fn test_simulation_in_account_currency() {
        let engine = Engine::default();
        let plan = StrategyPlan {
            tp_distance_pips: Some(dec!(20)),
            simulation: Some(LayerOutcomes {
                opened_trades: vec![4, 4, 0, 0, 0, 0],
                tp_hits: vec![4, 4, 0, 0, 0, 0],
            }),
            ..scenario_plan()
        };
        let mut acc = account(dec!(4500), Currency::Eur);
        acc.fx_override = Some(dec!(1.25));

        let e = engine.evaluate(&plan, &acc, &RateSnapshot::fallback()).unwrap();

        let sim = e.exposure.simulation.as_ref().unwrap();
        assert_eq!(sim.net_realized_pl_usd, dec!(32));
        assert_eq!(e.net_realized_pl_account_ccy, Some(dec!(25.6)));
    }

    #[test]
    fn test_request_from_json_without_rates() {
        let json = r#"{
            "plan": {
                "num_layers": 6,
                "lot_size_per_trade": "0.02",
                "pip_value": "0.1",
                "sl_distance_pips": "80",
                "first_to_last_layer_distance_pips": "40",
                "trades_per_layer": [4, 4, 4, 4, 8, 8]
            },
            "account": { "balance": "4500", "currency": "USD", "leverage": "1:500" }
        }"#;
        let request: EvaluationRequest = serde_json::from_str(json).unwrap();
        let e = Engine::default().evaluate_request(&request).unwrap();

        assert_eq!(e.exposure.theoretical_max_loss_usd, dec!(358.4));
        assert_eq!(e.leverage.ratio(), 500);
    }

    #[test]
    fn test_missing_gold_price_uses_default_and_warns() {
        let json = r#"{
            "plan": {
                "num_layers": 6,
                "lot_size_per_trade": "0.02",
                "pip_value": "0.1",
                "sl_distance_pips": "80",
                "first_to_last_layer_distance_pips": "40",
                "trades_per_layer": [4, 4, 4, 4, 8, 8]
            },
            "account": { "balance": "4500", "currency": "EUR", "leverage": "1:500" },
            "rates": { "eur_usd": "1.08" }
        }"#;
        let request: EvaluationRequest = serde_json::from_str(json).unwrap();
        let e = Engine::default().evaluate_request(&request).unwrap();

        assert!(e.risk.gold_price_defaulted);
        assert_eq!(e.risk.gold_price_usd, dec!(3000));
        // 0.64 * 100 * 3000 / 500
        assert_eq!(e.risk.margin_required_usd, dec!(384));
        assert!(e.risk.margin_required_account_ccy > Decimal::ZERO);
        assert!(e.risk.margin_usage_pct > Decimal::ZERO);
        assert!(e.warnings.iter().any(|w| w.contains("Gold price unavailable")));

        // An override stands in for the missing price
        let mut with_override = request.clone();
        with_override.account.gold_price_override = Some(dec!(2500));
        let e = Engine::default().evaluate_request(&with_override).unwrap();
        assert!(!e.risk.gold_price_defaulted);
        assert_eq!(e.risk.margin_required_usd, dec!(320));
        assert!(e.warnings.is_empty());
    }

    #[test]
    fn test_trade_count_overflow_rejected() {
        let plan = scenario_plan().with_distribution(vec![u32::MAX, 1]);
        let err = Engine::default()
            .evaluate(&plan, &account(dec!(4500), Currency::Usd), &RateSnapshot::fallback())
            .unwrap_err();

        assert_eq!(err.field(), "trades_per_layer");
    }

    #[test]
    fn test_parallel_evaluations_are_independent() {
        let engine = Engine::default();
        let rates = RateSnapshot::fallback();
        let expected = engine
            .evaluate(&scenario_plan(), &account(dec!(4500), Currency::Gbp), &rates)
            .unwrap();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let engine = &engine;
                    let rates = &rates;
                    s.spawn(move || {
                        // Interleave a different plan so threads do not all run the same input
                        let other = scenario_plan().with_distribution(vec![i + 1; 7]);
                        let _ = engine.evaluate(&other, &account(dec!(9000), Currency::Jpy), rates);
                        engine
                            .evaluate(&scenario_plan(), &account(dec!(4500), Currency::Gbp), rates)
                            .unwrap()
                    })
                })
                .collect();

            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }
}
