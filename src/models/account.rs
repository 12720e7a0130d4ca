//! Account the plan is evaluated against.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Currency;

/// Broker leverage, stored as the `N` of `1:N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LeverageRepr", into = "u32")]
pub struct Leverage(u32);

impl Leverage {
    /// Ratios offered by common gold CFD brokers.
    pub const COMMON: [u32; 9] = [50, 100, 200, 300, 400, 500, 1000, 1500, 2000];

    pub fn new(ratio: u32) -> Result<Self, String> {
        if ratio == 0 {
            return Err("Leverage ratio must be positive".to_string());
        }
        Ok(Self(ratio))
    }

    pub fn ratio(&self) -> u32 {
        self.0
    }
}

impl Default for Leverage {
    fn default() -> Self {
        Self(500)
    }
}

impl fmt::Display for Leverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1:{}", self.0)
    }
}

impl FromStr for Leverage {
    type Err = String;

    /// Accepts `"1:500"` or a bare `"500"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let ratio = match s.split_once(':') {
            Some((lhs, rhs)) => {
                if lhs.trim() != "1" {
                    return Err(format!("Leverage must look like 1:N, got {}", s));
                }
                rhs.trim()
            }
            None => s,
        };
        let ratio: u32 = ratio
            .parse()
            .map_err(|_| format!("Invalid leverage ratio: {}", s))?;
        Self::new(ratio)
    }
}

impl From<Leverage> for u32 {
    fn from(value: Leverage) -> Self {
        value.0
    }
}

/// Leverage as it may appear in JSON: a number or a `"1:N"` string.
#[derive(Deserialize)]
#[serde(untagged)]
enum LeverageRepr {
    Ratio(u32),
    Text(String),
}

impl TryFrom<LeverageRepr> for Leverage {
    type Error = String;

    fn try_from(value: LeverageRepr) -> Result<Self, Self::Error> {
        match value {
            LeverageRepr::Ratio(r) => Leverage::new(r),
            LeverageRepr::Text(s) => s.parse(),
        }
    }
}

/// Trading account context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountContext {
    /// Account balance in account currency
    pub balance: Decimal,

    /// Account currency
    pub currency: Currency,

    /// Broker leverage
    #[serde(default)]
    pub leverage: Leverage,

    /// User-entered gold price, preferred over the snapshot when positive
    #[serde(default)]
    pub gold_price_override: Option<Decimal>,

    /// User-entered USD rate for `currency` (market quoting direction),
    /// preferred over the snapshot when positive
    #[serde(default)]
    pub fx_override: Option<Decimal>,
}

impl AccountContext {
    pub fn new(balance: Decimal, currency: Currency, leverage: Leverage) -> Self {
        Self {
            balance,
            currency,
            leverage,
            gold_price_override: None,
            fx_override: None,
        }
    }

    /// Positive FX override, if any.
    pub fn effective_fx_override(&self) -> Option<Decimal> {
        self.fx_override.filter(|r| *r > Decimal::ZERO)
    }

    /// Positive gold price override, if any.
    pub fn effective_gold_override(&self) -> Option<Decimal> {
        self.gold_price_override.filter(|p| *p > Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_leverage() {
        assert_eq!("1:500".parse::<Leverage>().unwrap().ratio(), 500);
        assert_eq!("1 : 2000".parse::<Leverage>().unwrap().ratio(), 2000);
        assert_eq!("300".parse::<Leverage>().unwrap().ratio(), 300);
        assert_eq!("1:750".parse::<Leverage>().unwrap().ratio(), 750);
        assert!("1:0".parse::<Leverage>().is_err());
        assert!("2:500".parse::<Leverage>().is_err());
        assert!("abc".parse::<Leverage>().is_err());
    }

    #[test]
    fn test_leverage_json_forms() {
        let a: AccountContext =
            serde_json::from_str(r#"{"balance": "4500", "currency": "USD", "leverage": "1:200"}"#)
                .unwrap();
        assert_eq!(a.leverage.ratio(), 200);

        let b: AccountContext =
            serde_json::from_str(r#"{"balance": "4500", "currency": "EUR", "leverage": 100}"#)
                .unwrap();
        assert_eq!(b.leverage.ratio(), 100);
        assert_eq!(b.currency, Currency::Eur);
    }

    #[test]
    fn test_non_positive_overrides_are_unset() {
        let mut account = AccountContext::new(dec!(1000), Currency::Eur, Leverage::default());
        account.fx_override = Some(Decimal::ZERO);
        account.gold_price_override = Some(dec!(-1));

        assert_eq!(account.effective_fx_override(), None);
        assert_eq!(account.effective_gold_override(), None);
    }
}
