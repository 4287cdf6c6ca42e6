use crate::cache::QuoteCache;
use crate::datastore::DatastoreIface;
use crate::error::Error;
use crate::model::Trade;
use chrono::{DateTime, Utc};
use tradeblocks_instrument::Asset;

/// Resolves a USD price for a trade's base asset.
#[derive(Debug, Clone, Copy)]
pub struct PriceResolver;

impl PriceResolver {
    /// Resolve `estimated_usd_price = price * resolved_base_price` for
    /// `trade`, mutating `cache` on a live-mode cache miss.
    ///
    /// For a fiat-USD base token, the trade's own `price` field *is* the USD
    /// price directly; no cache or store lookup happens.
    ///
    /// Returns [`Error::PriceUnavailable`] if the store fails or the
    /// resolved base price is non-positive.
    pub async fn resolve_estimated_usd_price(
        &self,
        trade: &Trade,
        historical: bool,
        cache: &mut QuoteCache,
        datastore: &dyn DatastoreIface,
    ) -> Result<f64, Error> {
        if trade.base_token.is_fiat_usd() {
            return Ok(trade.price);
        }

        let base_price = self
            .resolve_base_price(&trade.base_token, trade.time, historical, cache, datastore)
            .await?;

        Ok(trade.price * base_price)
    }

    async fn resolve_base_price(
        &self,
        base_token: &Asset,
        time: DateTime<Utc>,
        historical: bool,
        cache: &mut QuoteCache,
        datastore: &dyn DatastoreIface,
    ) -> Result<f64, Error> {
        let price = if historical {
            // No local cache: historical prices are time-specific.
            datastore
                .get_asset_price_usd(base_token, time)
                .await
                .map_err(|_| Error::PriceUnavailable)?
        } else if let Some(cached) = cache.get(base_token) {
            cached
        } else {
            let quotation = datastore
                .get_asset_quotation_cache(base_token)
                .await
                .map_err(|_| Error::PriceUnavailable)?;
            cache.insert(base_token.clone(), quotation.price);
            quotation.price
        };

        if price <= 0.0 {
            return Err(Error::PriceUnavailable);
        }

        Ok(price)
    }
}
