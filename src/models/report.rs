//! Derived figures produced by the engine.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Currency, Leverage, TradeDistribution};

/// Per-layer breakdown, suitable for table or chart rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMetrics {
    /// 1-based layer number (layer 1 is nearest current price)
    pub layer: usize,

    /// Geometric distance to the stop; negative past the stop
    pub distance_to_stop_pips: Decimal,

    /// Loss of one trade on this layer if the stop is hit (never negative)
    pub loss_per_trade_usd: Decimal,

    pub planned_trades: u32,

    /// `loss_per_trade_usd * planned_trades`
    pub layer_loss_usd: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opened_trades: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_hits: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sl_hits: Option<u32>,
}

/// Realized P&L of a simulated set of layer outcomes, in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub profit_per_trade_usd: Decimal,
    pub total_realized_profit_usd: Decimal,
    pub total_realized_loss_usd: Decimal,
    pub net_realized_pl_usd: Decimal,
    pub closed_trades_count: u32,
    /// Zero when nothing was closed
    pub avg_profit_per_closed_trade_usd: Decimal,
}

/// Aggregate exposure across all layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureResult {
    pub total_trades: u32,
    pub total_lots: Decimal,
    /// Loss if every planned trade is stopped out
    pub theoretical_max_loss_usd: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationResult>,
}

/// Risk classification of a plan against the allowed risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    TooHigh,
    ApproachingLimit,
    WithinRange,
}

impl RiskStatus {
    pub fn message(&self) -> &'static str {
        match self {
            RiskStatus::TooHigh => "Risk too high! Reduce position size or increase balance.",
            RiskStatus::ApproachingLimit => "Close to your max allowed risk.",
            RiskStatus::WithinRange => "Risk level within allowed range.",
        }
    }
}

/// Margin usage classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginStatus {
    TooHigh,
    High,
    Moderate,
    Healthy,
}

impl MarginStatus {
    pub fn message(&self) -> &'static str {
        match self {
            MarginStatus::TooHigh => "Margin usage too high!",
            MarginStatus::High => "High margin usage.",
            MarginStatus::Moderate => "Moderate margin usage.",
            MarginStatus::Healthy => "Healthy margin usage.",
        }
    }
}

/// Risk and margin figures in account currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMarginResult {
    pub total_loss_account_ccy: Decimal,
    pub actual_risk_pct: Decimal,
    pub allowed_risk_pct: Decimal,
    pub risk_status: RiskStatus,

    /// Gold price the margin was computed with
    pub gold_price_usd: Decimal,
    /// No usable gold price was given; `gold_price_usd` is the default
    #[serde(default)]
    pub gold_price_defaulted: bool,
    pub margin_required_usd: Decimal,
    pub margin_required_account_ccy: Decimal,
    pub margin_usage_pct: Decimal,
    /// May be negative: the plan does not fit the account
    pub free_margin_account_ccy: Decimal,
    pub margin_status: MarginStatus,

    /// A needed FX rate was missing and USD figures were passed through
    pub conversion_degraded: bool,
}

/// Heuristic daily profit estimate, defined in EUR and converted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitEstimate {
    pub expected_profit_eur: Decimal,
    pub expected_profit_account_ccy: Decimal,
    pub degraded: bool,
}

/// Full result of evaluating one plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub currency: Currency,
    pub balance: Decimal,
    pub leverage: Leverage,
    pub price_gap_pips: Decimal,
    pub layers: Vec<LayerMetrics>,
    pub exposure: ExposureResult,
    pub risk: RiskMarginResult,
    pub profit_estimate: ProfitEstimate,
    /// Net simulated P&L in account currency, when simulating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_realized_pl_account_ccy: Option<Decimal>,
    pub conversion_degraded: bool,
    pub warnings: Vec<String>,
    pub rates_captured_at: DateTime<Utc>,
}

impl Evaluation {
    /// Advice for the trader based on the risk and margin status.
    pub fn recommendations(&self) -> Vec<&'static str> {
        if self.risk.risk_status == RiskStatus::TooHigh
            || self.risk.margin_status == MarginStatus::TooHigh
        {
            vec![
                "Reduce number of layers",
                "Reduce trades per layer",
                "Use smaller lot size",
                "Increase distance to SL",
                "Consider higher leverage (carefully!)",
            ]
        } else {
            vec![
                "Keep risk under control",
                "Don't risk more than 2-5% per trade",
                "Keep margin usage below 30%",
            ]
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sym = self.currency.symbol();

        writeln!(f, "\n{:=^60}", " TRADING PLAN ")?;
        writeln!(f, "Total Trades:     {}", self.exposure.total_trades)?;
        writeln!(f, "Total Lot Size:   {:.2} lots", self.exposure.total_lots)?;
        writeln!(f, "Price Gap:        {:.2} pips", self.price_gap_pips)?;
        writeln!(
            f,
            "Expected Profit:  {}{:.2} (base: €{:.2})",
            sym,
            self.profit_estimate.expected_profit_account_ccy,
            self.profit_estimate.expected_profit_eur
        )?;
        writeln!(f)?;
        writeln!(f, "--- Risk ---")?;
        writeln!(f, "Maximum Loss:     {}{:.2} (${:.2})",
            sym, self.risk.total_loss_account_ccy, self.exposure.theoretical_max_loss_usd)?;
        writeln!(f, "Actual Risk:      {:.2}%", self.risk.actual_risk_pct)?;
        writeln!(f, "Allowed Risk:     {:.2}%", self.risk.allowed_risk_pct)?;
        writeln!(f, "Status:           {}", self.risk.risk_status.message())?;
        writeln!(f)?;
        writeln!(f, "--- Margin ({}, XAUUSD ${:.2}) ---", self.leverage, self.risk.gold_price_usd)?;
        writeln!(f, "Margin Required:  {}{:.2}", sym, self.risk.margin_required_account_ccy)?;
        writeln!(f, "Margin Usage:     {:.2}%", self.risk.margin_usage_pct)?;
        writeln!(f, "Free Margin:      {}{:.2}", sym, self.risk.free_margin_account_ccy)?;
        writeln!(f, "Status:           {}", self.risk.margin_status.message())?;
        writeln!(f)?;
        writeln!(f, "--- Layers ---")?;
        writeln!(
            f,
            "{:>5} {:>10} {:>12} {:>7} {:>12}",
            "LAYER", "SL PIPS", "LOSS/TRADE", "TRADES", "LAYER LOSS"
        )?;
        for l in &self.layers {
            writeln!(
                f,
                "{:>5} {:>10.2} {:>12.2} {:>7} {:>12.2}",
                l.layer, l.distance_to_stop_pips, l.loss_per_trade_usd, l.planned_trades, l.layer_loss_usd
            )?;
        }

        if let Some(sim) = &self.exposure.simulation {
            writeln!(f)?;
            writeln!(f, "--- Simulation ---")?;
            writeln!(f, "Closed Trades:    {}", sim.closed_trades_count)?;
            writeln!(f, "Realized Profit:  ${:.2}", sim.total_realized_profit_usd)?;
            writeln!(f, "Realized Loss:    ${:.2}", sim.total_realized_loss_usd)?;
            writeln!(f, "Net P&L:          ${:.2}", sim.net_realized_pl_usd)?;
            if let Some(net) = self.net_realized_pl_account_ccy {
                writeln!(f, "Net P&L ({}):    {}{:.2}", self.currency, sym, net)?;
            }
            writeln!(f, "Avg per Trade:    ${:.2}", sim.avg_profit_per_closed_trade_usd)?;
        }

        writeln!(f)?;
        writeln!(f, "--- Recommendations ---")?;
        for r in self.recommendations() {
            writeln!(f, "  - {}", r)?;
        }

        if !self.warnings.is_empty() {
            writeln!(f)?;
            for w in &self.warnings {
                writeln!(f, "WARNING: {}", w)?;
            }
        }
        writeln!(f, "{:=^60}", "")?;
        Ok(())
    }
}

/// One evaluated row of the preset comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedConfigEntry {
    pub layers: usize,
    pub distribution: TradeDistribution,
    pub trades_distribution: Vec<u32>,
    pub exposure: ExposureResult,
    pub risk: RiskMarginResult,
}
