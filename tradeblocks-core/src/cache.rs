use std::collections::HashMap;
use tradeblocks_instrument::Asset;

/// Per-block local mapping from base-asset to USD price.
///
/// This is not a performance cache — it is a coherence mechanism. A new
/// [`QuoteCache`] is created empty when a block opens and is discarded
/// atomically when that block is sealed, so that every trade within one
/// block observes the same base-asset price.
#[derive(Debug, Default)]
pub struct QuoteCache {
    prices: HashMap<Asset, f64>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, asset: &Asset) -> Option<f64> {
        self.prices.get(asset).copied()
    }

    pub fn insert(&mut self, asset: Asset, price: f64) {
        self.prices.insert(asset, price);
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
