#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # Tradeblocks-Core
//! The trade-block enrichment-and-batching engine: resolves base-asset USD
//! prices, validates trades against stablecoin sanity bounds, aligns them
//! onto a fixed-duration wall-clock grid, and emits content-hashed
//! [`TradeBlock`]s downstream. See [`service::BlockService`] for the event
//! loop that drives the pipeline.

pub mod aligner;
pub mod cache;
pub mod config;
pub mod datastore;
pub mod error;
pub mod finalizer;
pub mod foreign_quote;
pub mod hash;
pub mod model;
pub mod resolver;
pub mod service;
pub mod validator;

pub use config::Config;
pub use error::Error;
pub use model::{ForeignQuotation, Quotation, Trade, TradeBlock, TradeBlockData};
pub use service::BlockService;
