use crate::model::{Trade, TradeBlockData};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Computes a deterministic structural hash over [`TradeBlockData`]
/// finalized trade block.
///
/// The encoding is canonical: fields are written in a fixed order, instants
/// as little-endian seconds + little-endian nanos, floats as little-endian
/// bits, booleans as one byte, and strings as a little-endian length prefix
/// followed by UTF-8 bytes. Two [`TradeBlockData`] values with identical
/// contents always produce identical digests, regardless of process or
/// platform.
pub fn hash_trade_block_data(data: &TradeBlockData) -> String {
    let mut hasher = Sha256::new();

    hash_time(&mut hasher, data.begin_time);
    hash_time(&mut hasher, data.end_time);
    hasher.update((data.trades_number as u64).to_le_bytes());

    for trade in &data.trades {
        hash_trade(&mut hasher, trade);
    }

    hex::encode(hasher.finalize())
}

fn hash_trade(hasher: &mut Sha256, trade: &Trade) {
    hash_str(hasher, &trade.pair);
    hash_str(hasher, &trade.base_token.blockchain);
    hash_str(hasher, &trade.base_token.address);
    hash_str(hasher, &trade.quote_token.blockchain);
    hash_str(hasher, &trade.quote_token.address);
    hasher.update(trade.price.to_le_bytes());
    hasher.update(trade.volume.to_le_bytes());
    hash_time(hasher, trade.time);
    hash_str(hasher, &trade.source);
    hasher.update([trade.verified_pair as u8]);
    hash_str(hasher, &trade.symbol);
    hasher.update(trade.estimated_usd_price.to_le_bytes());
}

fn hash_time(hasher: &mut Sha256, time: DateTime<Utc>) {
    hasher.update(time.timestamp().to_le_bytes());
    hasher.update(time.timestamp_subsec_nanos().to_le_bytes());
}

fn hash_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}
