/*
[INPUT]:  Raw text frames from a market-data stream (raw or combined envelope)
[OUTPUT]: Parsed MarketEvent with symbol, event time and kline/ticker payload
[POS]:    Message layer - envelope parsing and latency arithmetic
[UPDATE]: When adding new event types or changing envelope format
*/

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ProbeError, Result};

/// Kline (candlestick) payload, the `k` object of a kline event
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KlineData {
    #[serde(rename = "i")]
    pub interval: String,
    #[serde(rename = "t", default)]
    pub start_time: i64,
    #[serde(rename = "o", default)]
    pub open: String,
    #[serde(rename = "h", default)]
    pub high: String,
    #[serde(rename = "l", default)]
    pub low: String,
    #[serde(rename = "c")]
    pub close: String,
    #[serde(rename = "v", default)]
    pub volume: String,
    #[serde(rename = "x", default)]
    pub is_closed: bool,
}

/// 24h rolling ticker payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TickerData {
    #[serde(rename = "c")]
    pub last_price: String,
    #[serde(rename = "P", default)]
    pub price_change_percent: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Kline(KlineData),
    Ticker(TickerData),
    Other { event_type: String },
}

/// One parsed stream event
#[derive(Debug, Clone, PartialEq)]
pub struct MarketEvent {
    /// Upper-case symbol, e.g. `BTCUSDT`
    pub symbol: String,
    /// Exchange event time in epoch milliseconds (`E`)
    pub event_time_ms: i64,
    pub payload: Payload,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "e", default)]
    event_type: String,
    #[serde(rename = "E")]
    event_time: i64,
    #[serde(rename = "s", default)]
    symbol: Option<String>,
    #[serde(rename = "k", default)]
    kline: Option<KlineData>,
}

impl MarketEvent {
    /// Receive latency relative to the exchange event time, saturating on
    /// out-of-range event times
    pub fn latency_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.event_time_ms)
    }

    /// Short human-readable description of the payload for periodic reports
    pub fn summary(&self) -> String {
        match &self.payload {
            Payload::Kline(kline) => format!("interval={} close={}", kline.interval, kline.close),
            Payload::Ticker(ticker) => format!(
                "last={} change={}%",
                ticker.last_price, ticker.price_change_percent
            ),
            Payload::Other { event_type } if event_type.is_empty() => "event=unknown".to_string(),
            Payload::Other { event_type } => format!("event={event_type}"),
        }
    }
}

/// Parse a text frame into a [`MarketEvent`]
///
/// Accepts the raw stream form (`{"e":..,"E":..,"s":..}`) and the combined
/// envelope (`{"stream":"btcusdt@kline_1m","data":{..}}`). Unknown fields are ignored.
pub fn parse_market_event(text: &str) -> Result<MarketEvent> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(mut object) = value else {
        return Err(ProbeError::Parse("message is not a JSON object".to_string()));
    };

    let (data, stream_symbol) = match (object.remove("stream"), object.remove("data")) {
        (Some(Value::String(stream)), Some(data)) => {
            let symbol = stream
                .split('@')
                .next()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_uppercase());
            (data, symbol)
        }
        (stream, data) => {
            if !object.contains_key("s") {
                return Err(ProbeError::Parse("unrecognised message format".to_string()));
            }
            // Put back anything taken so the raw event sees its own fields.
            if let Some(stream) = stream {
                object.insert("stream".to_string(), stream);
            }
            if let Some(data) = data {
                object.insert("data".to_string(), data);
            }
            (Value::Object(object), None)
        }
    };

    let ticker = if data.get("e").and_then(Value::as_str) == Some("24hrTicker") {
        Some(serde_json::from_value::<TickerData>(data.clone())?)
    } else {
        None
    };

    let raw: RawEvent = serde_json::from_value(data)?;
    let symbol = raw
        .symbol
        .map(|s| s.to_uppercase())
        .or(stream_symbol)
        .ok_or_else(|| ProbeError::Parse("event has no symbol".to_string()))?;

    let payload = match (raw.kline, ticker) {
        (Some(kline), _) => Payload::Kline(kline),
        (None, Some(ticker)) => Payload::Ticker(ticker),
        (None, None) => Payload::Other {
            event_type: raw.event_type,
        },
    };

    Ok(MarketEvent {
        symbol,
        event_time_ms: raw.event_time,
        payload,
    })
}
