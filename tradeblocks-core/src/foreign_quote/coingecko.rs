use crate::error::Error;
use crate::model::ForeignQuotation;
use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use smol_str::SmolStr;

const SOURCE: &str = "Coingecko";

#[derive(Debug, Clone)]
pub struct CoinId(pub SmolStr);

impl CoinId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }
}

#[derive(Debug, Deserialize)]
struct CoinResponse {
    symbol: String,
    name: String,
    last_updated: String,
    market_data: MarketData,
}

#[derive(Debug, Deserialize)]
struct MarketData {
    current_price: CurrentPrice,
    #[serde(default)]
    total_volume: Option<CurrentPrice>,
}

#[derive(Debug, Deserialize)]
struct CurrentPrice {
    usd: f64,
}

/// Fetches current and previous-day USD price/volume for `coin` from the
/// Coingecko public API and assembles a [`ForeignQuotation`].
///
/// The history request uses `coin`'s own id, so previous-day data always
/// corresponds to the coin actually being polled.
pub async fn fetch_quotation(client: &reqwest::Client, coin: &CoinId) -> Result<ForeignQuotation, Error> {
    let current_url = format!(
        "https://api.coingecko.com/api/v3/coins/{}?localization=false&developer_data=false",
        coin.0
    );
    let current: CoinResponse = get_json(client, &current_url).await?;

    let yesterday = Utc::now() - chrono::Duration::days(1);
    let history_url = format!(
        "https://api.coingecko.com/api/v3/coins/{}/history?date={:02}-{:02}-{}",
        coin.0,
        yesterday.day(),
        yesterday.month(),
        yesterday.year()
    );
    let history: CoinResponse = get_json(client, &history_url).await?;

    let time = DateTime::parse_from_rfc3339(&current.last_updated)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(ForeignQuotation {
        symbol: current.symbol.to_uppercase().into(),
        name: current.name,
        price: current.market_data.current_price.usd,
        price_yesterday: history.market_data.current_price.usd,
        volume_yesterday_usd: history
            .market_data
            .total_volume
            .map(|v| v.usd)
            .unwrap_or(0.0),
        source: SOURCE.to_string(),
        time,
        itin: String::new(),
    })
}

async fn get_json<T: for<'de> Deserialize<'de>>(client: &reqwest::Client, url: &str) -> Result<T, Error> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(Error::StoreIO(format!(
            "Coingecko HTTP {} for {url}",
            response.status()
        )));
    }
    Ok(response.json::<T>().await?)
}
