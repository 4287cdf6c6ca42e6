use thiserror::Error;

/// All errors generated by `tradeblocks-core`.
#[derive(Debug, Error)]
pub enum Error {
    /// Persistence or lookup transport failure against the [`DatastoreIface`](crate::datastore::DatastoreIface).
    #[error("datastore IO error: {0}")]
    StoreIO(String),

    /// No quotation was found for the requested asset.
    #[error("no quotation found for asset")]
    NotFound,

    /// The [`PriceResolver`](crate::resolver::PriceResolver) could not produce a usable,
    /// positive USD price for a trade's base asset.
    #[error("no usable USD price available for base asset")]
    PriceUnavailable,

    /// The trade violated a structural caller contract (not used by the
    /// admit/drop decision table, which never errors — only an explicit
    /// malformed `Trade` reaches this variant).
    #[error("invalid trade: {0}")]
    InvalidTrade(String),

    /// Returned by a second call to [`BlockService::close`](crate::service::BlockService::close).
    #[error("BlockService is already closed")]
    AlreadyClosed,

    /// The deterministic structural hash over a block's data could not be
    /// computed; the block is still emitted with the sentinel hash
    /// `"hashError"`.
    #[error("failed to hash trade block data")]
    HashFailure,
}

impl From<redis::RedisError> for Error {
    fn from(value: redis::RedisError) -> Self {
        Error::StoreIO(value.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::StoreIO(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::StoreIO(value.to_string())
    }
}
