//! Currency conversion into the account currency.
//!
//! Every currency carries a [`QuoteDirection`]; one routine per direction
//! handles the arithmetic so no call site branches on currency codes. A
//! missing or zero rate never fails a conversion: the amount passes through
//! unconverted and the result is flagged as degraded.

use rust_decimal::Decimal;
use tracing::warn;

use crate::models::{Currency, QuoteDirection, RateSnapshot};

/// Converted amount plus whether a fallback was needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Converted {
    pub amount: Decimal,
    pub degraded: bool,
}

impl Converted {
    fn exact(amount: Decimal) -> Self {
        Self {
            amount,
            degraded: false,
        }
    }

    fn degraded(amount: Decimal) -> Self {
        Self {
            amount,
            degraded: true,
        }
    }
}

/// Convert a USD amount given the currency's market-quoted rate.
pub fn from_usd(amount_usd: Decimal, direction: QuoteDirection, rate: Decimal) -> Decimal {
    match direction {
        QuoteDirection::Base => amount_usd,
        QuoteDirection::UsdPerUnit => amount_usd / rate,
        QuoteDirection::UnitsPerUsd => amount_usd * rate,
    }
}

/// Inverse of [`from_usd`].
pub fn to_usd(amount: Decimal, direction: QuoteDirection, rate: Decimal) -> Decimal {
    match direction {
        QuoteDirection::Base => amount,
        QuoteDirection::UsdPerUnit => amount * rate,
        QuoteDirection::UnitsPerUsd => amount / rate,
    }
}

/// Converts USD and EUR amounts into one account currency.
#[derive(Debug, Clone)]
pub struct CurrencyConverter<'a> {
    currency: Currency,
    rates: &'a RateSnapshot,
    fx_override: Option<Decimal>,
}

impl<'a> CurrencyConverter<'a> {
    /// `fx_override` is the user's rate for `currency` in market quoting
    /// direction; zero or negative values are ignored.
    pub fn new(currency: Currency, rates: &'a RateSnapshot, fx_override: Option<Decimal>) -> Self {
        Self {
            currency,
            rates,
            fx_override: fx_override.filter(|r| *r > Decimal::ZERO),
        }
    }

    /// Rate for the account currency: the override if set, else the snapshot.
    pub fn account_rate(&self) -> Option<Decimal> {
        self.fx_override.or_else(|| self.rates.rate_for(self.currency))
    }

    pub fn usd_to_account(&self, amount_usd: Decimal) -> Converted {
        let direction = self.currency.quote_direction();
        if direction == QuoteDirection::Base {
            return Converted::exact(amount_usd);
        }

        match self.account_rate() {
            Some(rate) => Converted::exact(from_usd(amount_usd, direction, rate)),
            None => {
                warn!(
                    currency = %self.currency,
                    "No USD rate available, reporting USD amount unconverted"
                );
                Converted::degraded(amount_usd)
            }
        }
    }

    /// EUR amounts go through USD: EUR→USD at EURUSD, then USD→account.
    pub fn eur_to_account(&self, amount_eur: Decimal) -> Converted {
        if self.currency == Currency::Eur {
            return Converted::exact(amount_eur);
        }

        let Some(eur_usd) = self.rates.rate_for(Currency::Eur) else {
            warn!(
                currency = %self.currency,
                "No EURUSD rate available, reporting EUR amount unconverted"
            );
            return Converted::degraded(amount_eur);
        };

        let amount_usd = to_usd(amount_eur, QuoteDirection::UsdPerUnit, eur_usd);
        let direction = self.currency.quote_direction();
        if direction == QuoteDirection::Base {
            return Converted::exact(amount_usd);
        }

        match self.account_rate() {
            Some(rate) => Converted::exact(from_usd(amount_usd, direction, rate)),
            None => {
                warn!(
                    currency = %self.currency,
                    "No USD rate available, reporting EUR amount unconverted"
                );
                Converted::degraded(amount_eur)
            }
        }
    }
}
