//! Account currencies and the direction their USD rate is quoted in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the market quotes a currency against USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteDirection {
    /// The currency is USD itself; no rate involved.
    Base,
    /// Rate is USD per one unit of the currency (EURUSD, GBPUSD, AUDUSD).
    UsdPerUnit,
    /// Rate is units of the currency per one USD (USDCAD, USDCHF, USDJPY).
    UnitsPerUsd,
}

/// Supported account currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Chf,
    Aud,
    Cad,
    Jpy,
}

impl Currency {
    pub const ALL: [Currency; 7] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Chf,
        Currency::Aud,
        Currency::Cad,
        Currency::Jpy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Chf => "CHF",
            Currency::Aud => "AUD",
            Currency::Cad => "CAD",
            Currency::Jpy => "JPY",
        }
    }

    pub fn quote_direction(&self) -> QuoteDirection {
        match self {
            Currency::Usd => QuoteDirection::Base,
            Currency::Eur | Currency::Gbp | Currency::Aud => QuoteDirection::UsdPerUnit,
            Currency::Cad | Currency::Chf | Currency::Jpy => QuoteDirection::UnitsPerUsd,
        }
    }

    /// Display symbol used in reports.
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Chf => "Fr",
            Currency::Aud => "A$",
            Currency::Cad => "C$",
            Currency::Jpy => "¥",
        }
    }

    /// Market name of the USD pair for this currency, e.g. `EURUSD` or `USDJPY`.
    pub fn pair_name(&self) -> Option<&'static str> {
        match self {
            Currency::Usd => None,
            Currency::Eur => Some("EURUSD"),
            Currency::Gbp => Some("GBPUSD"),
            Currency::Aud => Some("AUDUSD"),
            Currency::Cad => Some("USDCAD"),
            Currency::Chf => Some("USDCHF"),
            Currency::Jpy => Some("USDJPY"),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unsupported currency: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_directions() {
        for c in [Currency::Eur, Currency::Gbp, Currency::Aud] {
            assert_eq!(c.quote_direction(), QuoteDirection::UsdPerUnit);
        }
        for c in [Currency::Cad, Currency::Chf, Currency::Jpy] {
            assert_eq!(c.quote_direction(), QuoteDirection::UnitsPerUsd);
        }
        assert_eq!(Currency::Usd.quote_direction(), QuoteDirection::Base);
    }

    #[test]
    fn test_parse_currency() {
        assert_eq!("cad".parse::<Currency>().unwrap(), Currency::Cad);
        assert_eq!(" JPY ".parse::<Currency>().unwrap(), Currency::Jpy);
        assert!("BTC".parse::<Currency>().is_err());
    }
}
