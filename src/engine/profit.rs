//! Expected daily profit heuristic.
//!
//! The estimate scales a reference profit (defined in EUR for the reference
//! 6-layer, 32-trade plan) by lot size, trade count and a complexity factor
//! that grows with layer count and layer spacing.

use rust_decimal::Decimal;

use crate::models::{ProfitEstimate, StrategyPlan};

use super::{CurrencyConverter, ProfitHeuristic};

/// Expected profit in EUR before conversion.
pub fn expected_profit_eur(
    heuristic: &ProfitHeuristic,
    baseline_lot: Decimal,
    plan: &StrategyPlan,
    price_gap_pips: Decimal,
) -> Decimal {
    if baseline_lot.is_zero() || heuristic.baseline_trades == 0 || heuristic.gap_divisor_pips.is_zero() {
        return Decimal::ZERO;
    }

    let lot_multiplier = plan.lot_size_per_trade / baseline_lot;
    let total_trades: u64 = plan.trades_per_layer.iter().map(|&t| u64::from(t)).sum();
    let trades_multiplier = Decimal::from(total_trades) / Decimal::from(heuristic.baseline_trades);

    let extra_layers = Decimal::from(plan.num_layers as i64 - i64::from(heuristic.reference_layers));
    let complexity = (Decimal::ONE
        + extra_layers * heuristic.per_layer_factor
        + price_gap_pips / heuristic.gap_divisor_pips * heuristic.gap_factor)
        .max(heuristic.min_complexity);

    heuristic.base_profit_eur * lot_multiplier * trades_multiplier * complexity
}

/// Expected profit converted into the account currency.
pub fn estimate(
    heuristic: &ProfitHeuristic,
    baseline_lot: Decimal,
    plan: &StrategyPlan,
    price_gap_pips: Decimal,
    converter: &CurrencyConverter<'_>,
) -> ProfitEstimate {
    let eur = expected_profit_eur(heuristic, baseline_lot, plan, price_gap_pips);
    let converted = converter.eur_to_account(eur);

    ProfitEstimate {
        expected_profit_eur: eur,
        expected_profit_account_ccy: converted.amount,
        degraded: converted.degraded,
    }
}
