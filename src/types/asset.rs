//! Tradable asset metadata.
//!
//! Static table of the assets the engine can quote and trade. The price
//! increment sets the grid row spacing per asset (large for high-priced
//! assets, small for low-priced ones) so the visible row span covers
//! roughly a minute of typical short-term movement.

use serde::Serialize;

/// Per-asset trading metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSpec {
    /// Canonical symbol (uppercase, e.g. "BTC")
    pub symbol: &'static str,
    /// Asset index on the execution gateway
    pub asset_index: u32,
    /// Grid price step between adjacent rows
    pub price_increment: f64,
    /// Fallback annualized volatility when the live feed has no history yet
    pub default_volatility: f64,
}

/// Assets available for tap trading (symbol -> gateway index, grid step, vol).
pub const ASSETS: &[AssetSpec] = &[
    AssetSpec { symbol: "BTC", asset_index: 0, price_increment: 10.0, default_volatility: 0.55 },
    AssetSpec { symbol: "ETH", asset_index: 1, price_increment: 1.0, default_volatility: 0.70 },
    AssetSpec { symbol: "SOL", asset_index: 5, price_increment: 0.05, default_volatility: 0.95 },
    AssetSpec { symbol: "DOGE", asset_index: 13, price_increment: 0.0001, default_volatility: 1.10 },
    AssetSpec { symbol: "XRP", asset_index: 25, price_increment: 0.0005, default_volatility: 0.90 },
    AssetSpec { symbol: "AVAX", asset_index: 6, price_increment: 0.01, default_volatility: 1.00 },
    AssetSpec { symbol: "LINK", asset_index: 18, price_increment: 0.005, default_volatility: 0.95 },
];

/// Look up an asset by symbol, case-insensitive.
pub fn lookup_asset(symbol: &str) -> Option<&'static AssetSpec> {
    ASSETS.iter().find(|a| a.symbol.eq_ignore_ascii_case(symbol))
}
