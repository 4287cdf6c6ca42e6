use crate::hash::hash_trade_block_data;
use crate::model::{TradeBlock, TradeBlockData};

/// Sorts, hashes, and assigns the hash of a populated [`TradeBlockData`]
/// block.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFinalizer;

impl BlockFinalizer {
    /// 1. Sort trades ascending by `time`, ties broken by arrival order
    ///    (stable sort).
    /// 2. Set `trades_number`.
    /// 3. Compute and assign the content hash. The canonical encoding in
    ///    [`crate::hash`] cannot fail for a well-formed block; the
    ///    `"hashError"` sentinel is
    ///    [`crate::model::HASH_ERROR_SENTINEL`], reserved for datastore
    ///    adapters that need to signal the condition downstream.
    pub fn finalize(&self, mut data: TradeBlockData) -> TradeBlock {
        data.trades.sort_by_key(|trade| trade.time);
        data.trades_number = data.trades.len();

        let block_hash = hash_trade_block_data(&data);

        TradeBlock { data, block_hash }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tradeblocks_instrument::Asset;

    fn trade_at(seconds: i64) -> crate::model::Trade {
        crate::model::Trade::new(
            "ETH/USDT",
            Asset::new("Ethereum", "0x0", "ETH"),
            Asset::new("Ethereum", "0x1", "USDT"),
            0.001,
            1.0,
            Utc.timestamp_opt(seconds, 0).unwrap(),
            "binance",
            true,
            "ETH",
        )
    }

    #[test]
    fn sorts_trades_ascending_by_time() {
        let finalizer = BlockFinalizer;
        let begin = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let end = Utc.timestamp_opt(1_700_000_120, 0).unwrap();
        let data = TradeBlockData {
            trades: vec![trade_at(1_700_000_090), trade_at(1_700_000_010)],
            begin_time: begin,
            end_time: end,
            trades_number: 0,
        };

        let block = finalizer.finalize(data);

        assert_eq!(block.data.trades[0].time, Utc.timestamp_opt(1_700_000_010, 0).unwrap());
        assert_eq!(block.data.trades[1].time, Utc.timestamp_opt(1_700_000_090, 0).unwrap());
    }

    #[test]
    fn ties_preserve_arrival_order() {
        let finalizer = BlockFinalizer;
        let begin = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let end = Utc.timestamp_opt(1_700_000_120, 0).unwrap();
        let mut first = trade_at(1_700_000_010);
        first.source = "first".into();
        let mut second = trade_at(1_700_000_010);
        second.source = "second".into();
        let data = TradeBlockData {
            trades: vec![first, second],
            begin_time: begin,
            end_time: end,
            trades_number: 0,
        };

        let block = finalizer.finalize(data);

        assert_eq!(block.data.trades[0].source, "first");
        assert_eq!(block.data.trades[1].source, "second");
    }

    #[test]
    fn sets_trades_number_to_len() {
        let finalizer = BlockFinalizer;
        let begin = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let end = Utc.timestamp_opt(1_700_000_120, 0).unwrap();
        let data = TradeBlockData {
            trades: vec![trade_at(1_700_000_010), trade_at(1_700_000_020)],
            begin_time: begin,
            end_time: end,
            trades_number: 0,
        };

        let block = finalizer.finalize(data);

        assert_eq!(block.data.trades_number, 2);
    }

    #[test]
    fn identical_data_hashes_identically_through_finalize() {
        let finalizer = BlockFinalizer;
        let begin = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let end = Utc.timestamp_opt(1_700_000_120, 0).unwrap();
        let make = || TradeBlockData {
            trades: vec![trade_at(1_700_000_010)],
            begin_time: begin,
            end_time: end,
            trades_number: 0,
        };

        let a = finalizer.finalize(make());
        let b = finalizer.finalize(make());

        assert_eq!(a.block_hash, b.block_hash);
    }
}
