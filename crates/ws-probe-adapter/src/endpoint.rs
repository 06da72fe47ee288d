/*
[INPUT]:  Endpoint base URL, symbol, kline interval
[OUTPUT]: Per-symbol stream URLs and host:port targets for proxy tunnelling
[POS]:    Endpoint layer - stream naming
[UPDATE]: When changing stream naming or multiplexing strategy
*/

use url::Url;

use crate::error::{ProbeError, Result};

pub const DEFAULT_ENDPOINT: &str = "wss://stream.binance.com:9443";

/// Stream name for a symbol's kline channel, e.g. `btcusdt@kline_1m`
pub fn kline_stream_name(symbol: &str, interval: &str) -> String {
    format!("{}@kline_{}", symbol.to_lowercase(), interval)
}

/// Raw single-stream URL: `<base>/ws/<symbol>@kline_<interval>`
pub fn kline_stream_url(base: &str, symbol: &str, interval: &str) -> Result<Url> {
    let base = Url::parse(base)?;
    match base.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(ProbeError::Config(format!(
                "endpoint scheme must be ws or wss, got {other}"
            )));
        }
    }

    let trimmed = base.as_str().trim_end_matches('/');
    let url = Url::parse(&format!(
        "{trimmed}/ws/{}",
        kline_stream_name(symbol, interval)
    ))?;
    Ok(url)
}

/// `host:port` authority used as the CONNECT target
pub fn authority(url: &Url) -> Result<(String, u16)> {
    let host = url
        .host_str()
        .ok_or_else(|| ProbeError::Config(format!("url has no host: {url}")))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| ProbeError::Config(format!("url has no port: {url}")))?;
    Ok((host.to_string(), port))
}
