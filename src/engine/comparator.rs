//! Side-by-side evaluation of the preset layer/trade distributions.

use tracing::debug;

use crate::error::EngineResult;
use crate::models::{AccountContext, FixedConfigEntry, RateSnapshot, StrategyPlan};

use super::{CurrencyConverter, Engine};

impl Engine {
    /// Evaluate every catalogue template with the sizing and geometry of
    /// `plan` (its own trade distribution is ignored).
    pub fn compare_presets(
        &self,
        plan: &StrategyPlan,
        account: &AccountContext,
        rates: &RateSnapshot,
    ) -> EngineResult<Vec<FixedConfigEntry>> {
        let converter =
            CurrencyConverter::new(account.currency, rates, account.effective_fx_override());

        self.policy()
            .catalogue()
            .into_iter()
            .map(|template| {
                let preset = plan.with_distribution(template.trades_distribution.clone());
                let assessment = self.assess(&preset, account, rates, &converter)?;

                debug!(
                    layers = template.layers,
                    distribution = %template.distribution,
                    max_loss_usd = %assessment.exposure.theoretical_max_loss_usd,
                    "Preset evaluated"
                );

                Ok(FixedConfigEntry {
                    layers: template.layers,
                    distribution: template.distribution,
                    trades_distribution: template.trades_distribution,
                    exposure: assessment.exposure,
                    risk: assessment.risk,
                })
            })
            .collect()
    }
}
