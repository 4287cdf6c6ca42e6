//! Periodic external price polling, independent of and sharing no state
//! with [`crate::service::BlockService`].

pub mod coingecko;

use crate::datastore::DatastoreIface;
use crate::error::Error;
use coingecko::CoinId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, warn};

#[derive(Debug, Clone)]
pub struct ForeignQuoteConfig {
    pub tracked_coins: Vec<CoinId>,
    pub refresh_delay: Duration,
}

impl ForeignQuoteConfig {
    pub fn new(tracked_coins: Vec<CoinId>, refresh_delay: Duration) -> Self {
        Self {
            tracked_coins,
            refresh_delay,
        }
    }
}

/// Handle to a running foreign-quote polling loop.
#[derive(Debug)]
pub struct ForeignQuotePoller {
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_done_rx: Option<oneshot::Receiver<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ForeignQuotePoller {
    pub fn spawn(config: ForeignQuoteConfig, datastore: Arc<dyn DatastoreIface>) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (shutdown_done_tx, shutdown_done_rx) = oneshot::channel();

        let worker = Worker {
            config,
            datastore,
            client: reqwest::Client::new(),
            shutdown_rx,
            shutdown_done_tx,
        };

        let handle = tokio::spawn(worker.run());

        Self {
            shutdown_tx: Some(shutdown_tx),
            shutdown_done_rx: Some(shutdown_done_rx),
            handle: Some(handle),
        }
    }

    /// Idempotent shutdown; a second call is a no-op.
    pub async fn close(&mut self) -> Result<(), Error> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
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

struct Worker {
    config: ForeignQuoteConfig,
    datastore: Arc<dyn DatastoreIface>,
    client: reqwest::Client,
    shutdown_rx: oneshot::Receiver<()>,
    shutdown_done_tx: oneshot::Sender<()>,
}

impl Worker {
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.config.refresh_delay);
        // The first tick fires immediately; skip it so the poller's first
        // real fetch happens after one full `refresh_delay`.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = &mut self.shutdown_rx => {
                    let _ = self.shutdown_done_tx.send(());
                    return;
                }
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }
    }

    async fn poll_once(&self) {
        if self.config.tracked_coins.is_empty() {
            warn!("ForeignQuotePoller has no tracked coins configured");
            return;
        }

        for coin in &self.config.tracked_coins {
            match coingecko::fetch_quotation(&self.client, coin).await {
                Ok(quotation) => {
                    if let Err(error) = self.datastore.save_foreign_quotation(&quotation).await {
                        error!(?error, coin = %coin.0, "failed to save foreign quotation");
                    }
                }
                Err(error) => {
                    warn!(?error, coin = %coin.0, "skipping coin for this tick");
                }
            }
        }
    }
}
