//! Market rate snapshot consumed by the engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::Currency;

/// Gold price and USD crosses captured at one instant.
///
/// A zero field means "unavailable"; conversions that need it degrade
/// rather than fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// XAUUSD in USD per troy ounce
    #[serde(default)]
    pub gold_price_usd: Decimal,

    /// USD per EUR
    #[serde(default)]
    pub eur_usd: Decimal,

    /// USD per GBP
    #[serde(default)]
    pub gbp_usd: Decimal,

    /// USD per AUD
    #[serde(default)]
    pub aud_usd: Decimal,

    /// CAD per USD
    #[serde(default)]
    pub usd_cad: Decimal,

    /// CHF per USD
    #[serde(default)]
    pub usd_chf: Decimal,

    /// JPY per USD
    #[serde(default)]
    pub usd_jpy: Decimal,

    /// When the provider captured these values
    #[serde(default = "Utc::now")]
    pub captured_at: DateTime<Utc>,

    /// Set by the provider when no live value could be fetched.
    /// Informational only: the engine never branches on it.
    #[serde(default)]
    pub is_fallback: bool,
}

impl RateSnapshot {
    /// Conventional defaults used when the market feed is unreachable.
    pub fn fallback() -> Self {
        Self {
            gold_price_usd: dec!(3000.0),
            eur_usd: dec!(1.08),
            gbp_usd: dec!(1.26),
            aud_usd: dec!(0.65),
            usd_cad: dec!(1.35),
            usd_chf: dec!(0.88),
            usd_jpy: dec!(148.0),
            captured_at: Utc::now(),
            is_fallback: true,
        }
    }

    /// Gold price, `None` when zero or negative.
    pub fn gold_price(&self) -> Option<Decimal> {
        (self.gold_price_usd > Decimal::ZERO).then_some(self.gold_price_usd)
    }

    /// The USD rate for `currency` in its market quoting direction.
    ///
    /// `None` for USD, and for any rate that is zero or negative.
    pub fn rate_for(&self, currency: Currency) -> Option<Decimal> {
        let rate = match currency {
            Currency::Usd => return None,
            Currency::Eur => self.eur_usd,
            Currency::Gbp => self.gbp_usd,
            Currency::Aud => self.aud_usd,
            Currency::Cad => self.usd_cad,
            Currency::Chf => self.usd_chf,
            Currency::Jpy => self.usd_jpy,
        };
        (rate > Decimal::ZERO).then_some(rate)
    }
}

impl Default for RateSnapshot {
    fn default() -> Self {
        Self::fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_for_skips_missing() {
        let mut rates = RateSnapshot::fallback();
        rates.usd_chf = Decimal::ZERO;

        assert_eq!(rates.rate_for(Currency::Eur), Some(dec!(1.08)));
        assert_eq!(rates.rate_for(Currency::Chf), None);
        assert_eq!(rates.rate_for(Currency::Usd), None);
    }

    #[test]
    fn test_missing_fields_deserialize_as_unavailable() {
        let rates: RateSnapshot =
            serde_json::from_str(r#"{"gold_price_usd": "2400.5", "eur_usd": "1.1"}"#).unwrap();

        assert_eq!(rates.gold_price_usd, dec!(2400.5));
        assert_eq!(rates.rate_for(Currency::Eur), Some(dec!(1.1)));
        assert_eq!(rates.rate_for(Currency::Jpy), None);
        assert!(!rates.is_fallback);

        let no_gold: RateSnapshot = serde_json::from_str(r#"{"eur_usd": "1.08"}"#).unwrap();
        assert_eq!(no_gold.gold_price(), None);
        assert_eq!(rates.gold_price(), Some(dec!(2400.5)));
    }
}
