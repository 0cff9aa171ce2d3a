pub mod hyperliquid;

pub use hyperliquid::HyperliquidWs;
