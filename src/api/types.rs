//! Response types for the Yahoo Finance chart API.

use serde::Deserialize;

/// Top-level response from /v8/finance/chart/{symbol}.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

impl ChartResponse {
    /// Latest regular-market price, if the response carries one.
    pub fn last_price(&self) -> Option<f64> {
        self.chart
            .result
            .as_ref()?
            .first()?
            .meta
            .regular_market_price
            .filter(|p| p.is_finite() && *p > 0.0)
    }

    /// Symbol echoed back by the API, if any.
    pub fn symbol(&self) -> Option<&str> {
        let meta = &self.chart.result.as_ref()?.first()?.meta;
        (!meta.symbol.is_empty()).then_some(meta.symbol.as_str())
    }

    /// Provider-side error as "code: description".
    pub fn error_message(&self) -> Option<String> {
        self.chart
            .error
            .as_ref()
            .map(|e| format!("{}: {}", e.code, e.description))
    }
}
