use crate::cache::QuoteCache;
use crate::datastore::DatastoreIface;
use crate::error::Error;
use crate::model::{is_stablecoin, Trade};
use crate::resolver::PriceResolver;
use chrono::{DateTime, Utc};

/// Outcome of running a [`Trade`] through [`TradeValidator::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The trade is appended to the current (or a newly opened) block.
    Admit,
    /// The trade is dropped from block aggregation, but was still
    /// persisted unconditionally by the caller regardless of this verdict.
    Drop,
}

/// Applies the verified-pair filter, price resolution, positive-price rule,
/// stablecoin sanity bound, and retrograde-time rule, in that order.
#[derive(Debug, Clone, Copy)]
pub struct TradeValidator {
    pub stablecoin_tolerance: f64,
}

impl TradeValidator {
    pub fn new(stablecoin_tolerance: f64) -> Self {
        Self {
            stablecoin_tolerance,
        }
    }

    /// Mutates `trade.estimated_usd_price` on a successful price
    /// resolution and returns whether the trade should be admitted into a
    /// block. `current_block_begin` is `None` when no block is open yet.
    pub async fn validate(
        &self,
        trade: &mut Trade,
        historical: bool,
        cache: &mut QuoteCache,
        datastore: &dyn DatastoreIface,
        current_block_begin: Option<DateTime<Utc>>,
    ) -> Admission {
        // 1. Verified-pair filter.
        if !trade.verified_pair {
            return Admission::Drop;
        }

        // 2. Price resolution.
        let resolver = PriceResolver;
        let estimated = match resolver
            .resolve_estimated_usd_price(trade, historical, cache, datastore)
            .await
        {
            Ok(price) => price,
            Err(_) => return Admission::Drop,
        };
        trade.estimated_usd_price = estimated;

        // 3. Positive-price rule.
        if trade.estimated_usd_price <= 0.0 {
            return Admission::Drop;
        }

        // 4. Stablecoin sanity.
        if is_stablecoin(&trade.symbol)
            && (trade.estimated_usd_price - 1.0).abs() > self.stablecoin_tolerance
        {
            return Admission::Drop;
        }

        // 5. Retrograde-time rule: never back-fill a closed block.
        if let Some(begin) = current_block_begin {
            if trade.time < begin {
                return Admission::Drop;
            }
        }

        Admission::Admit
    }
}
