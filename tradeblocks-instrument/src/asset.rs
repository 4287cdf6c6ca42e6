use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// The blockchain/network an [`Asset`] trades natively on.
///
/// This is a free-form identifier rather than a closed enum because new
/// chains show up faster than this crate can enumerate them; the one
/// reserved value is [`FIAT_BLOCKCHAIN`], the pseudo-chain used for fiat
/// currencies.
pub type Blockchain = SmolStr;

/// Reserved [`Blockchain`] value for fiat currencies.
pub const FIAT_BLOCKCHAIN: &str = "Fiat";

/// ISO-4217 numeric code for the US Dollar, used as the fiat USD [`Asset`]'s
/// `address`.
pub const FIAT_USD_ADDRESS: &str = "840";

/// Identifies a token by `{blockchain, address, symbol}`.
///
/// Equality and [`Hash`] rest on `(blockchain, address)` only — `symbol` is
/// informational and may vary across sources for the same underlying asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub blockchain: Blockchain,
    pub address: SmolStr,
    pub symbol: SmolStr,
}

impl Asset {
    pub fn new(
        blockchain: impl Into<Blockchain>,
        address: impl Into<SmolStr>,
        symbol: impl Into<SmolStr>,
    ) -> Self {
        Self {
            blockchain: blockchain.into(),
            address: address.into(),
            symbol: symbol.into(),
        }
    }

    /// The sole [`Asset`] whose self-price is defined to be `1.0`.
    pub fn fiat_usd() -> Self {
        Self::new(FIAT_BLOCKCHAIN, FIAT_USD_ADDRESS, "USD")
    }

    /// `true` iff this is the fiat USD asset.
    pub fn is_fiat_usd(&self) -> bool {
        self.blockchain == FIAT_BLOCKCHAIN && self.address == FIAT_USD_ADDRESS
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.blockchain == other.blockchain && self.address == other.address
    }
}

impl Eq for Asset {}

impl Hash for Asset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.blockchain.hash(state);
        self.address.hash(state);
    }
}

impl Display for Asset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} ({})", self.blockchain, self.address, self.symbol)
    }
}
