use crate::error::Error;
use crate::model::{ForeignQuotation, Quotation, Trade};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tradeblocks_instrument::Asset;

/// Abstract contract for persistence and quotation lookup consumed by the
/// core pipeline.
///
/// The core treats every call as potentially blocking I/O with no ordering
/// guarantee between calls beyond the single-writer discipline of the
/// [`BlockService`](crate::service::BlockService) event loop.
#[async_trait]
pub trait DatastoreIface: Send + Sync {
    /// Durable write of the raw trade. Failures are logged by the caller but
    /// never stop the pipeline.
    async fn save_trade(&self, trade: &Trade) -> Result<(), Error>;

    /// Requests the store to commit any buffered writes. Called once per
    /// block boundary.
    async fn flush(&self) -> Result<(), Error>;

    /// Historical lookup: the USD price of `asset` at `at`.
    async fn get_asset_price_usd(&self, asset: &Asset, at: DateTime<Utc>) -> Result<f64, Error>;

    /// Latest-price lookup via a shared external cache.
    async fn get_asset_quotation_cache(&self, asset: &Asset) -> Result<Quotation, Error>;

    /// Used only by the foreign-quote subsystem.
    async fn save_foreign_quotation(&self, quotation: &ForeignQuotation) -> Result<(), Error>;
}

/// In-memory [`DatastoreIface`] used for tests and as a quick-start adapter.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatastore {
    trades: Arc<Mutex<Vec<Trade>>>,
    quotations: Arc<Mutex<HashMap<Asset, Quotation>>>,
    historical_prices: Arc<Mutex<HashMap<(Asset, DateTime<Utc>), f64>>>,
    foreign_quotations: Arc<Mutex<Vec<ForeignQuotation>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the live-mode quotation cache, as a real external cache would be
    /// seeded out-of-band by a market-data ingestor.
    pub fn seed_quotation(&self, asset: Asset, price: f64, time: DateTime<Utc>) {
        self.quotations.lock().insert(asset, Quotation { price, time });
    }

    /// Seed a historical price, consulted only in `historical` mode.
    pub fn seed_historical_price(&self, asset: Asset, at: DateTime<Utc>, price: f64) {
        self.historical_prices.lock().insert((asset, at), price);
    }

    pub fn saved_trades(&self) -> Vec<Trade> {
        self.trades.lock().clone()
    }

    pub fn flush_count(&self) -> usize {
        *self.flush_count.lock()
    }

    pub fn saved_foreign_quotations(&self) -> Vec<ForeignQuotation> {
        self.foreign_quotations.lock().clone()
    }
}

#[async_trait]
impl DatastoreIface for InMemoryDatastore {
    async fn save_trade(&self, trade: &Trade) -> Result<(), Error> {
        self.trades.lock().push(trade.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        *self.flush_count.lock() += 1;
        Ok(())
    }

    async fn get_asset_price_usd(&self, asset: &Asset, at: DateTime<Utc>) -> Result<f64, Error> {
        self.historical_prices
            .lock()
            .get(&(asset.clone(), at))
            .copied()
            .ok_or(Error::NotFound)
    }

    async fn get_asset_quotation_cache(&self, asset: &Asset) -> Result<Quotation, Error> {
        self.quotations
            .lock()
            .get(asset)
            .copied()
            .ok_or(Error::NotFound)
    }

    async fn save_foreign_quotation(&self, quotation: &ForeignQuotation) -> Result<(), Error> {
        self.foreign_quotations.lock().push(quotation.clone());
        Ok(())
    }
}

/// Redis-backed [`DatastoreIface`] adapter.
///
/// Uses `GET`/`SET` for the shared quotation cache and `RPUSH` for raw-trade
/// audit storage, with keys namespaced under a configurable prefix.
/// Historical price lookup requires a dedicated time-series store and is
/// out of scope for this adapter; it always returns [`Error::NotFound`].
#[derive(Debug, Clone)]
pub struct RedisDatastore {
    client: redis::Client,
    prefix: String,
}

impl RedisDatastore {
    pub fn new(redis_url: &str, prefix: impl Into<String>) -> Result<Self, Error> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
            prefix: prefix.into(),
        })
    }

    fn quotation_key(&self, asset: &Asset) -> String {
        format!("{}:quotation:{}:{}", self.prefix, asset.blockchain, asset.address)
    }

    fn trades_key(&self) -> String {
        format!("{}:trades", self.prefix)
    }

    fn foreign_quotations_key(&self) -> String {
        format!("{}:foreign-quotations", self.prefix)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, Error> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl DatastoreIface for RedisDatastore {
    async fn save_trade(&self, trade: &Trade) -> Result<(), Error> {
        let json = serde_json::to_string(trade)?;
        let mut conn = self.connection().await?;
        redis::cmd("RPUSH")
            .arg(self.trades_key())
            .arg(json)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        // Redis writes above are already durable per-command; nothing to
        // buffer on this adapter, so Flush is a no-op that still reports
        // transport failures if the connection is unreachable.
        let _ = self.connection().await?;
        Ok(())
    }

    async fn get_asset_price_usd(&self, _asset: &Asset, _at: DateTime<Utc>) -> Result<f64, Error> {
        Err(Error::NotFound)
    }

    async fn get_asset_quotation_cache(&self, asset: &Asset) -> Result<Quotation, Error> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(self.quotation_key(asset))
            .query_async(&mut conn)
            .await?;
        let raw = raw.ok_or(Error::NotFound)?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save_foreign_quotation(&self, quotation: &ForeignQuotation) -> Result<(), Error> {
        let json = serde_json::to_string(quotation)?;
        let mut conn = self.connection().await?;
        redis::cmd("RPUSH")
            .arg(self.foreign_quotations_key())
            .arg(json)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }
}
