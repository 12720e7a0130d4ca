//! Risk engine: layer geometry, exposure, currency conversion, risk and
//! margin evaluation, and preset comparison.

mod comparator;
mod config;
pub mod converter;
mod evaluator;
mod exposure;
mod geometry;
mod profit;
mod risk;

pub use config::{ProfitHeuristic, RiskPolicy};
pub use converter::CurrencyConverter;
pub use evaluator::{Engine, EvaluationRequest};
pub use exposure::ExposureCalculator;
pub use geometry::LayerGeometry;
pub use risk::RiskAndMarginEvaluator;
