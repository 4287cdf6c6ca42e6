use crate::model::TradeBlockData;
use chrono::{DateTime, TimeZone, Utc};

/// What the caller should do with the current block before appending a
/// trade to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// No block is open yet; open one at the given bucket and append.
    OpenFirst { begin: DateTime<Utc>, end: DateTime<Utc> },
    /// The trade's `time` falls inside the currently open block.
    AppendToCurrent,
    /// The trade belongs to a later bucket: seal the current block, open a
    /// new one at the given bucket (which may not be the immediately next
    /// one — gaps produce no empty intervening blocks), and append.
    SealThenOpen { begin: DateTime<Utc>, end: DateTime<Utc> },
}

/// Aligns trade timestamps onto the fixed-duration wall-clock grid.
#[derive(Debug, Clone, Copy)]
pub struct BlockAligner {
    pub block_duration_secs: i64,
}

impl BlockAligner {
    pub fn new(block_duration_secs: i64) -> Self {
        Self { block_duration_secs }
    }

    /// The half-open `[begin, end)` bucket of width `block_duration_secs`
    /// that `time` falls into.
    pub fn bucket(&self, time: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let d = self.block_duration_secs;
        let begin_secs = time.timestamp().div_euclid(d) * d;
        let begin = Utc.timestamp_opt(begin_secs, 0).single().expect("valid bucket start");
        let end = Utc.timestamp_opt(begin_secs + d, 0).single().expect("valid bucket end");
        (begin, end)
    }

    /// Decide what to do with `current` (the open block, if any) for a
    /// trade occurring at `trade_time`.
    ///
    /// Does not mutate anything; the caller (the single-writer
    /// [`BlockService`](crate::service::BlockService) loop) is responsible
    /// for sealing, resetting the [`crate::cache::QuoteCache`], and calling
    /// `Flush` before opening the new block.
    pub fn align(&self, current: Option<&TradeBlockData>, trade_time: DateTime<Utc>) -> Alignment {
        match current {
            None => {
                let (begin, end) = self.bucket(trade_time);
                Alignment::OpenFirst { begin, end }
            }
            Some(block) if trade_time < block.end_time => Alignment::AppendToCurrent,
            Some(_) => {
                let (begin, end) = self.bucket(trade_time);
                Alignment::SealThenOpen { begin, end }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    #[test]
    fn bucket_aligns_to_duration_grid() {
        let aligner = BlockAligner::new(120);
        let (begin, end) = aligner.bucket(at(1_700_000_045));
        assert_eq!(begin, at(1_700_000_040));
        assert_eq!(end, at(1_700_000_160));
    }

    #[test]
    fn no_current_block_opens_first() {
        let aligner = BlockAligner::new(120);
        match aligner.align(None, at(1_700_000_000)) {
            Alignment::OpenFirst { begin, end } => {
                assert_eq!(begin, at(1_700_000_000));
                assert_eq!(end, at(1_700_000_120));
            }
            other => panic!("expected OpenFirst, got {other:?}"),
        }
    }

    #[test]
    fn trade_within_current_bucket_appends() {
        let aligner = BlockAligner::new(120);
        let current = TradeBlockData {
            trades: vec![],
            begin_time: at(1_700_000_000),
            end_time: at(1_700_000_120),
            trades_number: 0,
        };
        assert_eq!(
            aligner.align(Some(&current), at(1_700_000_090)),
            Alignment::AppendToCurrent
        );
    }

    #[test]
    fn trade_past_current_end_seals_and_opens_next() {
        let aligner = BlockAligner::new(120);
        let current = TradeBlockData {
            trades: vec![],
            begin_time: at(1_700_000_000),
            end_time: at(1_700_000_120),
            trades_number: 0,
        };
        match aligner.align(Some(&current), at(1_700_000_125)) {
            Alignment::SealThenOpen { begin, end } => {
                assert_eq!(begin, at(1_700_000_120));
                assert_eq!(end, at(1_700_000_240));
            }
            other => panic!("expected SealThenOpen, got {other:?}"),
        }
    }

    #[test]
    fn gaps_between_buckets_are_allowed() {
        let aligner = BlockAligner::new(120);
        let current = TradeBlockData {
            trades: vec![],
            begin_time: at(1_700_000_000),
            end_time: at(1_700_000_120),
            trades_number: 0,
        };
        // Several buckets ahead; no intervening empty blocks are implied.
        match aligner.align(Some(&current), at(1_700_001_000)) {
            Alignment::SealThenOpen { begin, .. } => {
                assert_eq!(begin, at(1_700_000_960));
            }
            other => panic!("expected SealThenOpen, got {other:?}"),
        }
    }
}
