use crate::aligner::{Alignment, BlockAligner};
use crate::cache::QuoteCache;
use crate::config::Config;
use crate::datastore::DatastoreIface;
use crate::error::Error;
use crate::finalizer::BlockFinalizer;
use crate::model::{Trade, TradeBlock, TradeBlockData};
use crate::validator::{Admission, TradeValidator};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tradeblocks_integration::channel::{BoundedChannel, BoundedTx, Tx};

/// Handle to a running [`BlockService`] event loop.
///
/// Producers clone [`trade_tx`](Self::trade_tx) to feed trades in; exactly
/// one consumer takes [`block_rx`](Self::take_block_rx) to receive
/// finalized blocks. The loop itself runs on a single `tokio::spawn`ed task
/// and is the sole mutator of its block state.
///
/// Producers only ever see [`BoundedTx<Trade>`], never the receiving half —
/// the [`Worker`] is the channel's sole owner.
#[derive(Debug)]
pub struct BlockService {
    trade_tx: BoundedTx<Trade>,
    block_rx: Option<mpsc::Receiver<TradeBlock>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_done_rx: Option<oneshot::Receiver<()>>,
    error: Arc<RwLock<Option<Error>>>,
    closed: bool,
    handle: Option<JoinHandle<()>>,
}

impl BlockService {
    /// Validates `config`, spawns the event-loop task, and returns the
    /// handle. Panics if `config` fails [`Config::validate`] — a malformed
    /// block duration is a caller programming error, not a runtime
    /// condition.
    pub fn spawn(config: Config, datastore: Arc<dyn DatastoreIface>) -> Self {
        config.validate().expect("invalid BlockService config");

        let BoundedChannel { tx: trade_tx, rx: trade_rx } = BoundedChannel::new(config.trade_channel_capacity);
        let (block_tx, block_rx) = mpsc::channel(config.block_channel_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (shutdown_done_tx, shutdown_done_rx) = oneshot::channel();
        let error = Arc::new(RwLock::new(None));

        let worker = Worker {
            trade_rx,
            block_tx,
            shutdown_rx,
            shutdown_done_tx,
            error: Arc::clone(&error),
            current_block: None,
            quote_cache: QuoteCache::new(),
            aligner: BlockAligner::new(config.block_duration_secs()),
            validator: TradeValidator::new(config.stablecoin_tolerance),
            finalizer: BlockFinalizer,
            historical: config.historical,
            datastore,
        };

        let handle = tokio::spawn(worker.run());

        Self {
            trade_tx,
            block_rx: Some(block_rx),
            shutdown_tx: Some(shutdown_tx),
            shutdown_done_rx: Some(shutdown_done_rx),
            error,
            closed: false,
            handle: Some(handle),
        }
    }

    /// Clone of the sender half of the bounded inbound trade channel.
    /// Producers hold only this capability.
    pub fn trade_tx(&self) -> BoundedTx<Trade> {
        self.trade_tx.clone()
    }

    /// Send a single trade, awaiting channel capacity for back-pressure.
    pub async fn process_trade(&self, trade: Trade) -> Result<(), <BoundedTx<Trade> as Tx<Trade>>::Error> {
        self.trade_tx.send(trade).await
    }

    /// Takes the receiving half of the bounded outbound block channel.
    /// Returns `None` if already taken — there is exactly one consumer.
    pub fn take_block_rx(&mut self) -> Option<mpsc::Receiver<TradeBlock>> {
        self.block_rx.take()
    }

    /// The last terminal error published by the event loop's cleanup path,
    /// if any.
    pub fn error(&self) -> Option<Error> {
        // thiserror's Error doesn't implement Clone across arbitrary
        // variants' payload types here it does, since every variant is a
        // String/unit.
        self.error.read().as_ref().map(error_clone)
    }

    /// Idempotent shutdown. Signals the event loop, which stops draining
    /// trades without finalizing the in-progress block, then awaits the
    /// loop's cleanup.
    ///
    /// A second call fails with [`Error::AlreadyClosed`].
    pub async fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Err(Error::AlreadyClosed);
        }
        self.closed = true;

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            // Ignore a closed receiver: the loop may already have exited.
            let _ = shutdown_tx.send(());
        }
        if let Some(shutdown_done_rx) = self.shutdown_done_rx.take() {
            let _ = shutdown_done_rx.await;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }

        Ok(())
    }
}

fn error_clone(error: &Error) -> Error {
    match error {
        Error::StoreIO(s) => Error::StoreIO(s.clone()),
        Error::NotFound => Error::NotFound,
        Error::PriceUnavailable => Error::PriceUnavailable,
        Error::InvalidTrade(s) => Error::InvalidTrade(s.clone()),
        Error::AlreadyClosed => Error::AlreadyClosed,
        Error::HashFailure => Error::HashFailure,
    }
}

/// Owns all block-pipeline state; runs exclusively on its own spawned task.
struct Worker {
    trade_rx: mpsc::Receiver<Trade>,
    block_tx: mpsc::Sender<TradeBlock>,
    shutdown_rx: oneshot::Receiver<()>,
    shutdown_done_tx: oneshot::Sender<()>,
    error: Arc<RwLock<Option<Error>>>,
    current_block: Option<TradeBlockData>,
    quote_cache: QuoteCache,
    aligner: BlockAligner,
    validator: TradeValidator,
    finalizer: BlockFinalizer,
    historical: bool,
    datastore: Arc<dyn DatastoreIface>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            tokio::select! {
                // Biased: a shutdown signal always wins a simultaneous
                // ready trade, so close() never races an extra trade in.
                biased;

                _ = &mut self.shutdown_rx => {
                    info!("BlockService shutting down");
                    self.cleanup(None);
                    return;
                }
                trade = self.trade_rx.recv() => match trade {
                    Some(trade) => self.process(trade).await,
                    None => {
                        // All producer handles dropped; nothing left to do.
                        info!("BlockService input channel closed, shutting down");
                        self.cleanup(None);
                        return;
                    }
                },
            }
        }
    }

    async fn process(&mut self, mut trade: Trade) {
        let current_begin = self.current_block.as_ref().map(|b| b.begin_time);

        let admission = self
            .validator
            .validate(
                &mut trade,
                self.historical,
                &mut self.quote_cache,
                self.datastore.as_ref(),
                current_begin,
            )
            .await;

        // Persisted unconditionally, regardless of admission.
        // Failures are logged but never stop the pipeline.
        if let Err(error) = self.datastore.save_trade(&trade).await {
            error!(?error, "failed to save trade");
        }

        if admission != Admission::Admit {
            return;
        }

        match self
            .aligner
            .align(self.current_block.as_ref(), trade.time)
        {
            Alignment::OpenFirst { begin, end } => {
                self.open_block(begin, end);
                self.append(trade);
            }
            Alignment::AppendToCurrent => {
                self.append(trade);
            }
            Alignment::SealThenOpen { begin, end } => {
                self.seal_current().await;
                self.open_block(begin, end);
                if let Err(error) = self.datastore.flush().await {
                    error!(?error, "failed to flush datastore at block boundary");
                }
                self.append(trade);
            }
        }
    }

    fn open_block(&mut self, begin: chrono::DateTime<chrono::Utc>, end: chrono::DateTime<chrono::Utc>) {
        self.current_block = Some(TradeBlockData {
            trades: Vec::new(),
            begin_time: begin,
            end_time: end,
            trades_number: 0,
        });
        self.quote_cache = QuoteCache::new();
    }

    fn append(&mut self, trade: Trade) {
        let block = self
            .current_block
            .as_mut()
            .expect("current block is always open before append");
        block.trades.push(trade);
    }

    async fn seal_current(&mut self) {
        let Some(data) = self.current_block.take() else {
            return;
        };
        let block = self.finalizer.finalize(data);
        if block.block_hash == crate::model::HASH_ERROR_SENTINEL {
            warn!("emitting block with sentinel hash after a hashing failure");
        }
        // Blocking send: no datastore call is in flight while this awaits,
        // so a slow consumer back-pressures only the event loop.
        if self.block_tx.send(block).await.is_err() {
            warn!("block receiver dropped, discarding finalized block");
        }
    }

    /// Must only be called from `run`. Publishes a terminal error, if any,
    /// under the exclusive write lock and signals shutdown completion.
    /// Deliberately does not finalize `current_block` — shutdown is
    /// cooperative and one-way.
    fn cleanup(self, error: Option<Error>) {
        if let Some(error) = error {
            *self.error.write() = Some(error);
        }
        let _ = self.shutdown_done_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::InMemoryDatastore;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;
    use tradeblocks_instrument::Asset;

    fn fiat_trade(time: chrono::DateTime<Utc>, price: f64) -> Trade {
        Trade::new(
            "USD/USD",
            Asset::fiat_usd(),
            Asset::fiat_usd(),
            price,
            1.0,
            time,
            "test",
            true,
            "USD",
        )
    }

    /// Aligned so that `BLOCK_ALIGNED_BASE` is exactly the start of a
    /// 120-second bucket (`1_700_000_040 / 120 == 14_166_667` exactly),
    /// keeping bucket-boundary math in these tests exact rather than
    /// relying on incidental rounding of an arbitrary timestamp.
    const BLOCK_ALIGNED_BASE: i64 = 1_700_000_040;

    #[tokio::test]
    async fn single_fiat_trade_produces_one_block() {
        let store = Arc::new(InMemoryDatastore::new());
        let config = Config::new(Duration::from_secs(120));
        let mut service = BlockService::spawn(config, store);
        let mut block_rx = service.take_block_rx().unwrap();

        let t0 = Utc.timestamp_opt(BLOCK_ALIGNED_BASE, 0).unwrap();
        service.process_trade(fiat_trade(t0, 1.23)).await.unwrap();

        service.close().await.unwrap();
        drop(service);

        let block = block_rx.recv().await.expect("one block emitted");
        assert_eq!(block.data.trades.len(), 1);
        assert_eq!(block.data.trades[0].estimated_usd_price, 1.23);
        assert_eq!(block.data.begin_time, t0);
        assert_eq!(block.data.end_time, Utc.timestamp_opt(BLOCK_ALIGNED_BASE + 120, 0).unwrap());
        assert!(block_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn trade_in_next_bucket_seals_previous_block() {
        let store = Arc::new(InMemoryDatastore::new());
        let config = Config::new(Duration::from_secs(120));
        let mut service = BlockService::spawn(config, store.clone());
        let mut block_rx = service.take_block_rx().unwrap();

        let t0 = Utc.timestamp_opt(BLOCK_ALIGNED_BASE, 0).unwrap();
        let t1 = Utc.timestamp_opt(BLOCK_ALIGNED_BASE + 125, 0).unwrap();
        service.process_trade(fiat_trade(t0, 1.0)).await.unwrap();
        service.process_trade(fiat_trade(t1, 1.0)).await.unwrap();

        let sealed = block_rx.recv().await.expect("first block sealed");
        assert_eq!(sealed.data.trades.len(), 1);
        assert_eq!(sealed.data.begin_time, t0);

        assert_eq!(store.flush_count(), 1);

        service.close().await.unwrap();
    }

    #[tokio::test]
    async fn unverified_pair_is_persisted_but_not_blocked() {
        let store = Arc::new(InMemoryDatastore::new());
        let config = Config::new(Duration::from_secs(120));
        let mut service = BlockService::spawn(config, store.clone());
        let mut block_rx = service.take_block_rx().unwrap();

        let mut trade = fiat_trade(Utc.timestamp_opt(BLOCK_ALIGNED_BASE, 0).unwrap(), 1.0);
        trade.verified_pair = false;
        service.process_trade(trade).await.unwrap();

        service.close().await.unwrap();
        drop(service);

        assert_eq!(store.saved_trades().len(), 1);
        assert!(block_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn close_is_idempotent_and_errors_on_second_call() {
        let store = Arc::new(InMemoryDatastore::new());
        let config = Config::new(Duration::from_secs(120));
        let mut service = BlockService::spawn(config, store);

        service.close().await.unwrap();
        let second = service.close().await;
        assert!(matches!(second, Err(Error::AlreadyClosed)));
    }

    #[tokio::test]
    async fn retrograde_trade_after_block_seal_is_dropped() {
        let store = Arc::new(InMemoryDatastore::new());
        let config = Config::new(Duration::from_secs(120));
        let mut service = BlockService::spawn(config, store.clone());
        let mut block_rx = service.take_block_rx().unwrap();

        let t0 = Utc.timestamp_opt(1_700_000_100, 0).unwrap();
        let t1 = Utc.timestamp_opt(1_700_000_200, 0).unwrap();
        let retrograde = Utc.timestamp_opt(1_700_000_050, 0).unwrap();

        service.process_trade(fiat_trade(t0, 1.0)).await.unwrap();
        service.process_trade(fiat_trade(t1, 1.0)).await.unwrap();
        service.process_trade(fiat_trade(retrograde, 1.0)).await.unwrap();

        let sealed = block_rx.recv().await.unwrap();
        assert_eq!(sealed.data.trades.len(), 1);

        service.close().await.unwrap();
        drop(service);

        // The retrograde trade was saved (audit trail) but never appended
        // to a block.
        assert_eq!(store.saved_trades().len(), 3);
    }
}
