#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # Tradeblocks-Integration
//! Low-level channel utilities used by the trade-block pipeline's single
//! writer event loop.

/// Defines a trait [`Tx`](channel::Tx) abstraction over different channel
/// kinds, plus concrete bounded/unbounded senders.
pub mod channel;

/// Determines if something is considered "unrecoverable", such as an
/// error that should terminate the owning task rather than be retried.
pub trait Unrecoverable {
    fn is_unrecoverable(&self) -> bool;
}

impl<T> Unrecoverable for tokio::sync::mpsc::error::SendError<T> {
    fn is_unrecoverable(&self) -> bool {
        true
    }
}
