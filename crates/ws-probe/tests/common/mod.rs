/*
[INPUT]:  Per-symbol MockConnector scripts
[OUTPUT]: Connector routing each stream URL to its symbol's script, event helpers
[POS]:    Test infrastructure - shared across ws-probe integration tests
[UPDATE]: When the Connector contract or event shapes change
*/

//! Common test utilities for ws-probe tests

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;
use ws_probe::{EventSink, Orchestrator, ProbeEvent, RunConfig};
use ws_probe_adapter::{Connector, Frame, FrameStream, MockConnector, MockStep, ProbeError};

/// Dispatches `/ws/<symbol>@kline_<interval>` to the matching symbol's connector
#[derive(Clone, Default)]
pub struct SymbolRouter {
    routes: HashMap<String, MockConnector>,
}

#[allow(dead_code)]
impl SymbolRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, symbol: &str, connector: MockConnector) -> Self {
        self.routes.insert(symbol.to_string(), connector);
        self
    }

    pub fn get(&self, symbol: &str) -> &MockConnector {
        &self.routes[symbol]
    }

    pub fn open_handles(&self) -> usize {
        self.routes.values().map(MockConnector::open_handles).sum()
    }
}

#[async_trait]
impl Connector for SymbolRouter {
    async fn connect(&self, url: &Url) -> Result<Box<dyn FrameStream>, ProbeError> {
        let symbol = url
            .path()
            .trim_start_matches("/ws/")
            .split('@')
            .next()
            .unwrap_or_default();
        match self.routes.get(symbol) {
            Some(connector) => connector.connect(url).await,
            None => Err(ProbeError::Connect(format!("no route for {url}"))),
        }
    }
}

/// Config for `symbols` with deterministic backoff
#[allow(dead_code)]
pub fn test_config(symbols: &[&str]) -> RunConfig {
    let mut config = RunConfig {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        ..RunConfig::default()
    };
    config.backoff.jitter_ms = 0;
    config.shutdown_timeout_secs = 2;
    config
}

#[allow(dead_code)]
pub fn orchestrator_with_observer(
    config: RunConfig,
    connector: Arc<dyn Connector>,
) -> (Orchestrator, mpsc::UnboundedReceiver<ProbeEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let orchestrator = Orchestrator::new(config, connector)
        .unwrap()
        .with_events(EventSink::with_observer(tx));
    (orchestrator, rx)
}

#[allow(dead_code)]
pub fn kline(symbol: &str, close: &str) -> MockStep {
    MockStep::Frame(Frame::Text(format!(
        r#"{{"e":"kline","E":1700000000000,"s":"{}","k":{{"i":"1m","c":"{close}","x":false}}}}"#,
        symbol.to_uppercase()
    )))
}

#[allow(dead_code)]
pub fn remote_close(code: u16, reason: &str) -> MockStep {
    MockStep::Frame(Frame::Close {
        code: Some(code),
        reason: reason.to_string(),
    })
}

/// Everything emitted so far, without waiting
#[allow(dead_code)]
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ProbeEvent>) -> Vec<ProbeEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Wait (in virtual time) until an event matching `pred` arrives
#[allow(dead_code)]
pub async fn wait_for<F>(rx: &mut mpsc::UnboundedReceiver<ProbeEvent>, pred: F) -> ProbeEvent
where
    F: Fn(&ProbeEvent) -> bool,
{
    let fut = async {
        loop {
            match rx.recv().await {
                Some(event) if pred(&event) => return event,
                Some(_) => continue,
                None => panic!("event channel closed"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(600), fut)
        .await
        .expect("timed out waiting for event")
}
