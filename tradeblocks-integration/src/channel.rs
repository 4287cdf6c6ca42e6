use crate::Unrecoverable;
use std::fmt::Debug;

/// Abstraction over a channel sender capable of delivering a `T`.
///
/// Producers hold only this capability — never the receiving half — so that
/// ownership of a channel's consuming side stays with whoever constructed
/// it.
pub trait Tx<T>
where
    Self: Debug + Clone + Send,
{
    type Error: Unrecoverable + Debug;

    /// Send blocks until the channel has capacity, providing the
    /// back-pressure a bounded inbound channel should apply.
    fn send(
        &self,
        item: T,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;
}

/// A bounded [`Tx`] backed by [`tokio::sync::mpsc::Sender`].
///
/// Cloning a [`BoundedTx`] is cheap and is how multiple producer tasks share
/// a single inbound channel.
#[derive(Debug, Clone)]
pub struct BoundedTx<T> {
    inner: tokio::sync::mpsc::Sender<T>,
}

impl<T> BoundedTx<T> {
    pub fn new(inner: tokio::sync::mpsc::Sender<T>) -> Self {
        Self { inner }
    }
}

impl<T> Tx<T> for BoundedTx<T>
where
    T: Debug + Clone + Send + 'static,
{
    type Error = tokio::sync::mpsc::error::SendError<T>;

    async fn send(&self, item: T) -> Result<(), Self::Error> {
        self.inner.send(item).await
    }
}

/// Convenience pair bundling a bounded channel's sender and receiver.
#[derive(Debug)]
pub struct BoundedChannel<T> {
    pub tx: BoundedTx<T>,
    pub rx: tokio::sync::mpsc::Receiver<T>,
}

impl<T> BoundedChannel<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = tokio::sync::mpsc::channel(capacity);
        Self {
            tx: BoundedTx::new(tx),
            rx,
        }
    }
}
