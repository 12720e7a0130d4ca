//! Data models for plans, accounts, market rates, and evaluation reports.

mod account;
mod currency;
mod plan;
mod rates;
mod report;
mod template;

pub use account::{AccountContext, Leverage};
pub use currency::{Currency, QuoteDirection};
pub use plan::{LayerOutcomes, StrategyPlan};
pub use rates::RateSnapshot;
pub use report::{
    Evaluation, ExposureResult, FixedConfigEntry, LayerMetrics, MarginStatus, ProfitEstimate,
    RiskMarginResult, RiskStatus, SimulationResult,
};
pub use template::{ConfigTemplate, TradeDistribution};
