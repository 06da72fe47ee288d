/*
[INPUT]:  YAML configuration file and/or CLI overrides
[OUTPUT]: Validated RunConfig (symbols, interval, proxy, log level, tunables)
[POS]:    Configuration layer - probe setup
[UPDATE]: When adding new configuration options
*/

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use ws_probe_adapter::{DEFAULT_ENDPOINT, ProbeError, ProxyConfig};

/// Kline intervals accepted by the stream endpoint
pub const SUPPORTED_INTERVALS: &[&str] = &[
    "1s", "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w",
    "1M",
];

/// Upper bound for second-based tunables (one day)
const MAX_SECS: u64 = 86_400;
/// Upper bound for millisecond-based tunables (one day)
const MAX_MILLIS: u64 = MAX_SECS * 1_000;

/// Log verbosity accepted on the command line and in config files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "WARN")]
    Warning,
    Error,
}

impl LogLevel {
    /// `EnvFilter` directive for this level
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(format!(
                "invalid log level {other:?}, expected one of DEBUG, INFO, WARNING, ERROR"
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Top-level configuration for a probe run
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunConfig {
    /// Stream endpoint base, e.g. `wss://stream.binance.com:9443`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Symbols to subscribe, one session each
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Kline interval, e.g. `1m`
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
    #[serde(default)]
    pub backoff: BackoffConfig,
    #[serde(default)]
    pub report: ReportConfig,
    /// TCP + proxy + WebSocket handshake bound
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Bound on waiting for sessions to exit after shutdown
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HeartbeatConfig {
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_pong_timeout_secs")]
    pub pong_timeout_secs: u64,
    /// Period of the staleness check, independent of frame arrival
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BackoffConfig {
    #[serde(default = "default_backoff_base_ms")]
    pub base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub max_ms: u64,
    /// Upper bound of the random delay added to each backoff
    #[serde(default = "default_backoff_jitter_ms")]
    pub jitter_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReportConfig {
    #[serde(default = "default_symbol_interval_secs")]
    pub symbol_interval_secs: u64,
    #[serde(default = "default_global_interval_secs")]
    pub global_interval_secs: u64,
    /// Emit a message-batch event every N messages per symbol
    #[serde(default = "default_message_log_every")]
    pub message_log_every: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            symbols: default_symbols(),
            interval: default_interval(),
            proxy: ProxyConfig::default(),
            log_level: LogLevel::default(),
            heartbeat: HeartbeatConfig::default(),
            backoff: BackoffConfig::default(),
            report: ReportConfig::default(),
            connect_timeout_secs: default_connect_timeout_secs(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval_secs(),
            pong_timeout_secs: default_pong_timeout_secs(),
            check_interval_ms: default_check_interval_ms(),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: default_backoff_base_ms(),
            max_ms: default_backoff_max_ms(),
            jitter_ms: default_backoff_jitter_ms(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            symbol_interval_secs: default_symbol_interval_secs(),
            global_interval_secs: default_global_interval_secs(),
            message_log_every: default_message_log_every(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_symbols() -> Vec<String> {
    vec![
        "btcusdt".to_string(),
        "ethusdt".to_string(),
        "bnbusdt".to_string(),
    ]
}

fn default_interval() -> String {
    "1m".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

fn default_ping_interval_secs() -> u64 {
    20
}

fn default_pong_timeout_secs() -> u64 {
    10
}

fn default_check_interval_ms() -> u64 {
    1_000
}

fn default_backoff_base_ms() -> u64 {
    1_000
}

fn default_backoff_max_ms() -> u64 {
    60_000
}

fn default_backoff_jitter_ms() -> u64 {
    500
}

fn default_symbol_interval_secs() -> u64 {
    10
}

fn default_global_interval_secs() -> u64 {
    60
}

fn default_message_log_every() -> u64 {
    50
}

impl RunConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Normalise symbols and reject configurations no session could run with.
    ///
    /// Symbols are lower-cased and de-duplicated (first occurrence wins).
    pub fn validated(mut self) -> Result<Self, ProbeError> {
        let mut seen = HashSet::new();
        let mut symbols = Vec::with_capacity(self.symbols.len());
        for raw in &self.symbols {
            let symbol = raw.trim().to_lowercase();
            if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ProbeError::Config(format!("invalid symbol {raw:?}")));
            }
            if !seen.insert(symbol.clone()) {
                warn!(%symbol, "duplicate symbol ignored");
                continue;
            }
            symbols.push(symbol);
        }
        if symbols.is_empty() {
            return Err(ProbeError::Config("symbol list is empty".to_string()));
        }
        self.symbols = symbols;

        self.interval = self.interval.trim().to_string();
        if !SUPPORTED_INTERVALS.contains(&self.interval.as_str()) {
            return Err(ProbeError::Config(format!(
                "unsupported interval {:?}",
                self.interval
            )));
        }

        if self.proxy.enabled && (self.proxy.host.trim().is_empty() || self.proxy.port == 0) {
            return Err(ProbeError::Config(
                "proxy enabled but host or port is missing".to_string(),
            ));
        }

        if self.report.message_log_every == 0 {
            return Err(ProbeError::Config(
                "report.message_log_every must be greater than zero".to_string(),
            ));
        }

        // Durations end up added to `Instant`s, so they stay within a day.
        let durations = [
            ("heartbeat.ping_interval_secs", self.heartbeat.ping_interval_secs, MAX_SECS),
            ("heartbeat.pong_timeout_secs", self.heartbeat.pong_timeout_secs, MAX_SECS),
            ("heartbeat.check_interval_ms", self.heartbeat.check_interval_ms, MAX_MILLIS),
            ("backoff.base_ms", self.backoff.base_ms, MAX_MILLIS),
            ("backoff.max_ms", self.backoff.max_ms, MAX_MILLIS),
            ("report.symbol_interval_secs", self.report.symbol_interval_secs, MAX_SECS),
            ("report.global_interval_secs", self.report.global_interval_secs, MAX_SECS),
            ("connect_timeout_secs", self.connect_timeout_secs, MAX_SECS),
            ("shutdown_timeout_secs", self.shutdown_timeout_secs, MAX_SECS),
        ];
        for (name, value, max) in durations {
            if value == 0 {
                return Err(ProbeError::Config(format!("{name} must be greater than zero")));
            }
            if value > max {
                return Err(ProbeError::Config(format!("{name} ({value}) exceeds {max}")));
            }
        }
        if self.backoff.jitter_ms > MAX_MILLIS {
            return Err(ProbeError::Config(format!(
                "backoff.jitter_ms ({}) exceeds {MAX_MILLIS}",
                self.backoff.jitter_ms
            )));
        }

        if self.backoff.base_ms > self.backoff.max_ms {
            return Err(ProbeError::Config(format!(
                "backoff.base_ms ({}) exceeds backoff.max_ms ({})",
                self.backoff.base_ms, self.backoff.max_ms
            )));
        }

        ws_probe_adapter::kline_stream_url(&self.endpoint, &self.symbols[0], &self.interval)?;

        Ok(self)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl HeartbeatConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn pong_timeout(&self) -> Duration {
        Duration::from_secs(self.pong_timeout_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}

impl ReportConfig {
    pub fn symbol_interval(&self) -> Duration {
        Duration::from_secs(self.symbol_interval_secs)
    }

    pub fn global_interval(&self) -> Duration {
        Duration::from_secs(self.global_interval_secs)
    }
}
