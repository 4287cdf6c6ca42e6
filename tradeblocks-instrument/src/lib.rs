#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # Tradeblocks-Instrument
//! Core [`Asset`](asset::Asset) data structure shared by every crate in the
//! trade-block ecosystem.

/// [`Asset`](asset::Asset) and related data structures.
pub mod asset;

pub use asset::Asset;
