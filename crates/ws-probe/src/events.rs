/*
[INPUT]:  Session lifecycle changes and periodic report ticks
[OUTPUT]: Structured tracing lines plus an optional event channel for observers
[POS]:    Event layer - typed probe events routed to logging
[UPDATE]: When adding event kinds or changing their log shape
*/

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use ws_probe_adapter::ErrorKind;

use crate::stats::{StatsSnapshot, format_uptime};

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeEvent {
    Connected {
        symbol: String,
    },
    Disconnected {
        symbol: String,
        kind: ErrorKind,
        reason: String,
        connected_for: Option<Duration>,
    },
    Reconnecting {
        symbol: String,
        attempt: u32,
        delay: Duration,
        cause: ErrorKind,
    },
    MessageBatch {
        symbol: String,
        count: u64,
    },
    PeriodicSymbolReport {
        symbol: String,
        summary: String,
        latency_ms: Option<i64>,
        data_age: Option<Duration>,
    },
    PeriodicGlobalReport {
        snapshot: StatsSnapshot,
        symbols: usize,
        streaming: usize,
    },
    Error {
        symbol: String,
        kind: ErrorKind,
        detail: String,
    },
}

impl ProbeEvent {
    pub fn symbol(&self) -> Option<&str> {
        match self {
            ProbeEvent::Connected { symbol }
            | ProbeEvent::Disconnected { symbol, .. }
            | ProbeEvent::Reconnecting { symbol, .. }
            | ProbeEvent::MessageBatch { symbol, .. }
            | ProbeEvent::PeriodicSymbolReport { symbol, .. }
            | ProbeEvent::Error { symbol, .. } => Some(symbol),
            ProbeEvent::PeriodicGlobalReport { .. } => None,
        }
    }

    pub fn log(&self) {
        match self {
            ProbeEvent::Connected { symbol } => {
                info!(%symbol, "stream connected");
            }
            ProbeEvent::Disconnected {
                symbol,
                kind,
                reason,
                connected_for,
            } => {
                warn!(
                    %symbol,
                    error_kind = %kind,
                    reason = %reason,
                    connected_for_ms = connected_for.map(|d| d.as_millis() as u64),
                    "stream disconnected"
                );
            }
            ProbeEvent::Reconnecting {
                symbol,
                attempt,
                delay,
                cause,
            } => {
                info!(
                    %symbol,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error_kind = %cause,
                    "reconnecting after backoff"
                );
            }
            ProbeEvent::MessageBatch { symbol, count } => {
                info!(%symbol, count, "messages received");
            }
            ProbeEvent::PeriodicSymbolReport {
                symbol,
                summary,
                latency_ms,
                data_age,
            } => {
                info!(
                    %symbol,
                    summary = %summary,
                    latency_ms,
                    data_age_secs = data_age.map(|d| d.as_secs_f64()),
                    "symbol report"
                );
            }
            ProbeEvent::PeriodicGlobalReport {
                snapshot,
                symbols,
                streaming,
            } => {
                info!(
                    uptime = %format_uptime(snapshot.uptime),
                    total_messages = snapshot.total_messages,
                    total_reconnects = snapshot.total_reconnects,
                    total_errors = snapshot.total_errors,
                    parse_errors = snapshot.parse_errors,
                    pings = snapshot.pings_received,
                    pongs = snapshot.pongs_received,
                    messages_per_minute = %format!("{:.2}", snapshot.messages_per_minute()),
                    symbols,
                    streaming,
                    "global report"
                );
            }
            ProbeEvent::Error {
                symbol,
                kind: ErrorKind::Parse,
                detail,
            } => {
                warn!(%symbol, error_kind = %ErrorKind::Parse, detail = %detail, "message skipped");
            }
            ProbeEvent::Error {
                symbol,
                kind,
                detail,
            } => {
                error!(%symbol, error_kind = %kind, detail = %detail, "session error");
            }
        }
    }
}

/// Where sessions and reporters send their events.
///
/// Every event is logged; an attached observer also receives a copy.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    observer: Option<mpsc::UnboundedSender<ProbeEvent>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(observer: mpsc::UnboundedSender<ProbeEvent>) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    pub fn emit(&self, event: ProbeEvent) {
        event.log();
        if let Some(observer) = &self.observer
            && observer.send(event).is_err()
        {
            debug!("event observer dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observer_receives_emitted_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::with_observer(tx);

        sink.emit(ProbeEvent::Connected {
            symbol: "btcusdt".to_string(),
        });
        sink.emit(ProbeEvent::Reconnecting {
            symbol: "btcusdt".to_string(),
            attempt: 2,
            delay: Duration::from_secs(2),
            cause: ErrorKind::ConnectionClosed,
        });

        let first = rx.try_recv().unwrap();
        assert_eq!(first.symbol(), Some("btcusdt"));
        assert!(matches!(first, ProbeEvent::Connected { .. }));
        assert!(matches!(
            rx.try_recv().unwrap(),
            ProbeEvent::Reconnecting { attempt: 2, .. }
        ));
    }

    #[test]
    fn emit_without_observer_only_logs() {
        let sink = EventSink::new();
        sink.emit(ProbeEvent::MessageBatch {
            symbol: "ethusdt".to_string(),
            count: 50,
        });

        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        EventSink::with_observer(tx).emit(ProbeEvent::Error {
            symbol: "ethusdt".to_string(),
            kind: ErrorKind::Parse,
            detail: "bad json".to_string(),
        });
    }
}
