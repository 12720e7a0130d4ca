//! Risk and margin evaluation against the account.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AccountContext, ExposureResult, MarginStatus, RiskMarginResult, RiskStatus,
};

use super::{CurrencyConverter, RiskPolicy};

/// Combines converted loss with the balance, and lot exposure with leverage.
pub struct RiskAndMarginEvaluator<'a> {
    policy: &'a RiskPolicy,
}

impl<'a> RiskAndMarginEvaluator<'a> {
    pub fn new(policy: &'a RiskPolicy) -> Self {
        Self { policy }
    }

    /// Allowed risk in percent for a balance.
    ///
    /// Linear from `max_risk_fraction` at `start_balance` down to
    /// `min_risk_fraction` at `end_balance`; flat outside that range.
    pub fn allowed_risk_pct(&self, balance: Decimal) -> Decimal {
        let p = self.policy;
        let span = p.end_balance - p.start_balance;
        if span <= Decimal::ZERO {
            return p.max_risk_fraction * dec!(100);
        }

        let clamped = balance.max(p.start_balance).min(p.end_balance);
        let progress = (clamped - p.start_balance) / span;
        let fraction = p.max_risk_fraction - progress * (p.max_risk_fraction - p.min_risk_fraction);
        fraction * dec!(100)
    }

    /// Loss as a percentage of balance; zero for an empty account.
    pub fn actual_risk_pct(&self, loss: Decimal, balance: Decimal) -> Decimal {
        percent_of(loss, balance)
    }

    pub fn risk_status(&self, actual_pct: Decimal, allowed_pct: Decimal) -> RiskStatus {
        if actual_pct > allowed_pct {
            RiskStatus::TooHigh
        } else if actual_pct > allowed_pct * self.policy.risk_warning_fraction {
            RiskStatus::ApproachingLimit
        } else {
            RiskStatus::WithinRange
        }
    }

    /// Margin in USD to hold `total_lots` of gold at `gold_price_usd`.
    pub fn margin_required_usd(&self, total_lots: Decimal, gold_price_usd: Decimal, leverage: u32) -> Decimal {
        if leverage == 0 {
            return Decimal::ZERO;
        }
        total_lots * self.policy.contract_size_oz * gold_price_usd / Decimal::from(leverage)
    }

    pub fn margin_status(&self, usage_pct: Decimal) -> MarginStatus {
        let p = self.policy;
        if usage_pct > p.margin_too_high_pct {
            MarginStatus::TooHigh
        } else if usage_pct > p.margin_high_pct {
            MarginStatus::High
        } else if usage_pct > p.margin_moderate_pct {
            MarginStatus::Moderate
        } else {
            MarginStatus::Healthy
        }
    }

    /// Full risk and margin report for an exposure.
    pub fn evaluate(
        &self,
        exposure: &ExposureResult,
        account: &AccountContext,
        converter: &CurrencyConverter<'_>,
        gold_price_usd: Decimal,
    ) -> EngineResult<RiskMarginResult> {
        if account.balance < Decimal::ZERO {
            return Err(EngineError::invalid(
                "balance",
                format!("must not be negative, got {}", account.balance),
            ));
        }
        let leverage = account.leverage.ratio();
        if leverage == 0 {
            return Err(EngineError::invalid("leverage", "ratio must be positive"));
        }

        let loss = converter.usd_to_account(exposure.theoretical_max_loss_usd);
        let actual_risk_pct = self.actual_risk_pct(loss.amount, account.balance);
        let allowed_risk_pct = self.allowed_risk_pct(account.balance);

        let margin_required_usd =
            self.margin_required_usd(exposure.total_lots, gold_price_usd, leverage);
        let margin = converter.usd_to_account(margin_required_usd);
        let margin_usage_pct = percent_of(margin.amount, account.balance);

        let result = RiskMarginResult {
            total_loss_account_ccy: loss.amount,
            actual_risk_pct,
            allowed_risk_pct,
            risk_status: self.risk_status(actual_risk_pct, allowed_risk_pct),
            gold_price_usd,
            gold_price_defaulted: false,
            margin_required_usd,
            margin_required_account_ccy: margin.amount,
            margin_usage_pct,
            free_margin_account_ccy: account.balance - margin.amount,
            margin_status: self.margin_status(margin_usage_pct),
            conversion_degraded: loss.degraded || margin.degraded,
        };

        debug!(
            actual_risk_pct = %result.actual_risk_pct,
            allowed_risk_pct = %result.allowed_risk_pct,
            margin_usage_pct = %result.margin_usage_pct,
            "Risk evaluated"
        );

        Ok(result)
    }
}

fn percent_of(amount: Decimal, balance: Decimal) -> Decimal {
    if balance.is_zero() {
        return Decimal::ZERO;
    }
    amount / balance * dec!(100)
}
