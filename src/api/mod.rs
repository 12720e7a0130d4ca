//! External market data: gold and FX quotes for rate snapshots.

mod rates_client;
mod types;

pub use rates_client::RatesClient;
