use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tradeblocks_instrument::Asset;

/// Stablecoin symbols subject to the sanity-tolerance check.
pub const STABLECOINS: &[&str] = &["USDC", "USDT", "TUSD", "DAI", "PAX", "BUSD"];

pub fn is_stablecoin(symbol: &str) -> bool {
    STABLECOINS.iter().any(|s| *s == symbol)
}

/// A single observed trade, enriched in-place by the pipeline with
/// `estimated_usd_price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub pair: String,
    pub base_token: Asset,
    pub quote_token: Asset,
    /// Observed quote/base ratio.
    pub price: f64,
    pub volume: f64,
    /// Authoritative event instant; never rewritten by the pipeline.
    pub time: DateTime<Utc>,
    pub source: String,
    pub verified_pair: bool,
    pub symbol: String,
    /// Populated by [`crate::resolver::PriceResolver`]; `0.0` on entry.
    pub estimated_usd_price: f64,
}

impl Trade {
    pub fn new(
        pair: impl Into<String>,
        base_token: Asset,
        quote_token: Asset,
        price: f64,
        volume: f64,
        time: DateTime<Utc>,
        source: impl Into<String>,
        verified_pair: bool,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            pair: pair.into(),
            base_token,
            quote_token,
            price,
            volume,
            time,
            source: source.into(),
            verified_pair,
            symbol: symbol.into(),
            estimated_usd_price: 0.0,
        }
    }
}

/// A temporally bounded group of validated trades.
///
/// Invariants: `end_time == begin_time + blockDuration`; every
/// `trades[i].time` lies in `[begin_time, end_time)`; after finalization
/// `trades` is sorted ascending by `time`, stable on arrival order;
/// `trades_number == trades.len()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeBlockData {
    pub trades: Vec<Trade>,
    pub begin_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub trades_number: usize,
}

/// Sentinel hash stored when deterministic hashing fails.
pub const HASH_ERROR_SENTINEL: &str = "hashError";

/// A [`TradeBlockData`] plus its content hash, assigned exactly once at
/// finalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeBlock {
    pub data: TradeBlockData,
    pub block_hash: String,
}

/// A USD-denominated price for an asset at a point in time, as returned by
/// [`DatastoreIface::get_asset_quotation_cache`](crate::datastore::DatastoreIface::get_asset_quotation_cache).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Quotation {
    pub price: f64,
    pub time: DateTime<Utc>,
}

/// A per-asset foreign quotation polled from an external price source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignQuotation {
    pub symbol: SmolStr,
    pub name: String,
    pub price: f64,
    pub price_yesterday: f64,
    pub volume_yesterday_usd: f64,
    pub source: String,
    pub time: DateTime<Utc>,
    pub itin: String,
}
