/*
[INPUT]:  Symbol stream URL, Connector, BackoffPolicy, GlobalStats, CancellationToken
[OUTPUT]: Per-symbol SubscriptionState snapshots via `watch` + probe events
[POS]:    Session layer - one symbol's connect/stream/backoff lifecycle
[UPDATE]: When changing state transitions, heartbeat handling or failure accounting
*/

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;
use ws_probe_adapter::{
    Connector, ErrorKind, Frame, FrameStream, HeartbeatMonitor, MarketEvent, ProbeError,
    parse_market_event,
};

use crate::backoff::BackoffPolicy;
use crate::config::RunConfig;
use crate::events::{EventSink, ProbeEvent};
use crate::stats::GlobalStats;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Connecting,
    Streaming,
    Backoff,
    Closed,
}

/// Read-only view of one session, published on every change
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionState {
    pub symbol: String,
    pub status: SessionStatus,
    /// Reset only by a valid data message, never by a bare socket open
    pub consecutive_failures: u32,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_latency_ms: Option<i64>,
    pub message_count: u64,
    pub last_payload: Option<MarketEvent>,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl SubscriptionState {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            status: SessionStatus::Connecting,
            consecutive_failures: 0,
            last_message_at: None,
            last_latency_ms: None,
            message_count: 0,
            last_payload: None,
            connected_at: None,
            last_error: None,
        }
    }
}

/// Timing knobs for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
    pub heartbeat_check: Duration,
    pub message_log_every: u64,
}

impl SessionSettings {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            ping_interval: config.heartbeat.ping_interval(),
            pong_timeout: config.heartbeat.pong_timeout(),
            heartbeat_check: config.heartbeat.check_interval(),
            message_log_every: config.report.message_log_every.max(1),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&RunConfig::default())
    }
}

/// Collaborators shared by every session of a run
#[derive(Clone)]
pub struct SessionContext {
    pub connector: Arc<dyn Connector>,
    pub stats: Arc<GlobalStats>,
    pub events: EventSink,
    pub policy: BackoffPolicy,
    pub settings: SessionSettings,
}

enum Step {
    Connecting,
    Streaming(Box<dyn FrameStream>),
    Backoff(ErrorKind),
    Closed,
}

enum StreamExit {
    Disconnected(ProbeError),
    Shutdown,
}

/// Owns one symbol's subscription and the connection handle behind it.
///
/// At most one connection is held at a time; it is closed on every exit from
/// streaming, including shutdown.
pub struct SubscriptionSession {
    url: Url,
    ctx: SessionContext,
    state: SubscriptionState,
    state_tx: watch::Sender<SubscriptionState>,
    connected_since: Option<Instant>,
    shutdown: CancellationToken,
}

impl SubscriptionSession {
    pub fn new(symbol: &str, url: Url, ctx: SessionContext, shutdown: CancellationToken) -> Self {
        let state = SubscriptionState::new(symbol);
        let (state_tx, _rx) = watch::channel(state.clone());
        Self {
            url,
            ctx,
            state,
            state_tx,
            connected_since: None,
            shutdown,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.state.symbol
    }

    /// Subscribe to state snapshots
    pub fn subscribe(&self) -> watch::Receiver<SubscriptionState> {
        self.state_tx.subscribe()
    }

    /// Drive the state machine until shutdown; returns the final state
    pub async fn run(mut self) -> SubscriptionState {
        debug!(symbol = %self.state.symbol, url = %self.url, "session started");

        let mut step = Step::Connecting;
        loop {
            step = match step {
                Step::Connecting => self.connecting().await,
                Step::Streaming(conn) => self.streaming(conn).await,
                Step::Backoff(cause) => self.backoff(cause).await,
                Step::Closed => break,
            };
        }

        self.set_status(SessionStatus::Closed);
        debug!(symbol = %self.state.symbol, "session closed");
        self.state
    }

    async fn connecting(&mut self) -> Step {
        self.set_status(SessionStatus::Connecting);
        if self.shutdown.is_cancelled() {
            return Step::Closed;
        }

        let result = tokio::select! {
            _ = self.shutdown.cancelled() => return Step::Closed,
            result = self.ctx.connector.connect(&self.url) => result,
        };

        match result {
            Ok(conn) => {
                self.connected_since = Some(Instant::now());
                self.state.connected_at = Some(Utc::now());
                self.state.status = SessionStatus::Streaming;
                self.publish();
                self.ctx.events.emit(ProbeEvent::Connected {
                    symbol: self.state.symbol.clone(),
                });
                Step::Streaming(conn)
            }
            Err(err) => {
                let kind = err.kind();
                self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
                self.state.last_error = Some(err.to_string());
                self.ctx.stats.increment_errors();
                self.publish();
                self.ctx.events.emit(ProbeEvent::Error {
                    symbol: self.state.symbol.clone(),
                    kind,
                    detail: err.to_string(),
                });
                if err.is_retryable() {
                    Step::Backoff(kind)
                } else {
                    warn!(symbol = %self.state.symbol, error = %err, "non-retryable error; session stops");
                    Step::Closed
                }
            }
        }
    }

    async fn streaming(&mut self, mut conn: Box<dyn FrameStream>) -> Step {
        let exit = self.pump(conn.as_mut()).await;

        if tokio::time::timeout(CLOSE_TIMEOUT, conn.close()).await.is_err() {
            debug!(symbol = %self.state.symbol, "connection close timed out; dropping handle");
        }
        drop(conn);

        let connected_for = self.connected_since.take().map(|since| since.elapsed());
        self.state.connected_at = None;

        match exit {
            StreamExit::Shutdown => Step::Closed,
            StreamExit::Disconnected(err) => {
                let kind = err.kind();
                self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
                self.state.last_error = Some(err.to_string());
                self.ctx.stats.increment_reconnects();
                self.publish();
                self.ctx.events.emit(ProbeEvent::Disconnected {
                    symbol: self.state.symbol.clone(),
                    kind,
                    reason: err.to_string(),
                    connected_for,
                });
                Step::Backoff(kind)
            }
        }
    }

    /// Read frames until the connection fails, goes stale or shutdown is requested
    async fn pump(&mut self, conn: &mut dyn FrameStream) -> StreamExit {
        let settings = self.ctx.settings.clone();
        let opened = Instant::now();
        let mut heartbeat = HeartbeatMonitor::new(opened);

        // First tick fires immediately so the opening ping starts the pong clock.
        let mut ping_tick = tokio::time::interval(settings.ping_interval);
        ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut check_tick =
            tokio::time::interval_at(opened + settings.heartbeat_check, settings.heartbeat_check);
        check_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return StreamExit::Shutdown,
                frame = conn.recv() => match frame {
                    Some(Ok(Frame::Text(text))) => self.on_text(&text),
                    Some(Ok(Frame::Ping(_))) => {
                        self.ctx.stats.increment_pings();
                        trace!(symbol = %self.state.symbol, "ping received");
                    }
                    Some(Ok(Frame::Pong(_))) => {
                        heartbeat.on_pong_received(Instant::now());
                        self.ctx.stats.increment_pongs();
                        trace!(symbol = %self.state.symbol, "pong received");
                    }
                    Some(Ok(Frame::Close { code, reason })) => {
                        return StreamExit::Disconnected(ProbeError::closed(code, reason));
                    }
                    Some(Err(err)) if err.is_local_recoverable() => self.on_local_error(err),
                    Some(Err(err)) => return StreamExit::Disconnected(err),
                    None => {
                        return StreamExit::Disconnected(ProbeError::closed(None, "stream ended"));
                    }
                },
                _ = ping_tick.tick() => {
                    // A peer that stops reading can park the send; bound it like a missing pong.
                    let send =
                        tokio::time::timeout(settings.pong_timeout, conn.send(Frame::Ping(Vec::new())));
                    tokio::select! {
                        _ = self.shutdown.cancelled() => return StreamExit::Shutdown,
                        sent = send => match sent {
                            Ok(Ok(())) => heartbeat.on_ping_sent(Instant::now()),
                            Ok(Err(err)) => return StreamExit::Disconnected(err),
                            Err(_) => {
                                return StreamExit::Disconnected(ProbeError::StaleHeartbeat {
                                    elapsed: settings.pong_timeout,
                                });
                            }
                        },
                    }
                }
                _ = check_tick.tick() => {
                    let now = Instant::now();
                    if heartbeat.is_stale(now, settings.pong_timeout) {
                        let elapsed = heartbeat.awaiting_for(now).unwrap_or_default();
                        return StreamExit::Disconnected(ProbeError::StaleHeartbeat { elapsed });
                    }
                }
            }
        }
    }

    fn on_text(&mut self, text: &str) {
        match parse_market_event(text) {
            Ok(event) => {
                let now = Utc::now();
                self.state.last_latency_ms = Some(event.latency_ms(now.timestamp_millis()));
                self.state.last_message_at = Some(now);
                self.state.last_payload = Some(event);
                self.state.message_count += 1;
                self.state.consecutive_failures = 0;
                self.ctx.stats.increment_messages();
                self.publish();

                if self.state.message_count % self.ctx.settings.message_log_every == 0 {
                    self.ctx.events.emit(ProbeEvent::MessageBatch {
                        symbol: self.state.symbol.clone(),
                        count: self.state.message_count,
                    });
                }
            }
            Err(err) => self.on_local_error(err),
        }
    }

    /// Payload-level failure; counted and skipped while the stream stays up
    fn on_local_error(&mut self, err: ProbeError) {
        self.ctx.stats.increment_parse_errors();
        self.ctx.events.emit(ProbeEvent::Error {
            symbol: self.state.symbol.clone(),
            kind: err.kind(),
            detail: err.to_string(),
        });
    }

    async fn backoff(&mut self, cause: ErrorKind) -> Step {
        self.set_status(SessionStatus::Backoff);

        let attempt = self.state.consecutive_failures.max(1);
        let delay = self
            .ctx
            .policy
            .jittered_delay(attempt, &mut rand::thread_rng());
        self.ctx.events.emit(ProbeEvent::Reconnecting {
            symbol: self.state.symbol.clone(),
            attempt,
            delay,
            cause,
        });

        tokio::select! {
            _ = self.shutdown.cancelled() => Step::Closed,
            _ = tokio::time::sleep(delay) => Step::Connecting,
        }
    }

    fn set_status(&mut self, status: SessionStatus) {
        if self.state.status != status {
            self.state.status = status;
            self.publish();
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;
    use ws_probe_adapter::{MockAttempt, MockConnector, MockStep};

    use super::*;

    fn kline(event_time: i64) -> Frame {
        Frame::Text(format!(
            r#"{{"e":"kline","E":{event_time},"s":"BTCUSDT","k":{{"i":"1m","c":"100.5"}}}}"#
        ))
    }

    fn session_with(
        connector: MockConnector,
        settings: SessionSettings,
    ) -> (
        SubscriptionSession,
        Arc<GlobalStats>,
        mpsc::UnboundedReceiver<ProbeEvent>,
        CancellationToken,
    ) {
        let stats = Arc::new(GlobalStats::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let ctx = SessionContext {
            connector: Arc::new(connector),
            stats: stats.clone(),
            events: EventSink::with_observer(tx),
            policy: BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(60), Duration::ZERO),
            settings,
        };
        let url = Url::parse("ws://mock/ws/btcusdt@kline_1m").unwrap();
        let session = SubscriptionSession::new("btcusdt", url, ctx, shutdown.clone());
        (session, stats, rx, shutdown)
    }

    #[tokio::test(start_paused = true)]
    async fn failures_reset_only_after_first_valid_message() {
        let connector = MockConnector::new(vec![
            MockAttempt::Refuse("refused".to_string()),
            MockAttempt::Refuse("refused".to_string()),
            MockAttempt::Refuse("refused".to_string()),
            MockAttempt::Accept(vec![MockStep::Wait(Duration::from_secs(5)), kline_step(1)]),
        ]);
        let (session, stats, mut events, shutdown) =
            session_with(connector.clone(), SessionSettings::default());
        let state = session.subscribe();
        let handle = tokio::spawn(session.run());

        loop {
            if let ProbeEvent::Connected { .. } = events.recv().await.unwrap() {
                break;
            }
        }
        {
            let snapshot = state.borrow();
            assert_eq!(snapshot.status, SessionStatus::Streaming);
            assert_eq!(snapshot.consecutive_failures, 3);
            assert_eq!(snapshot.message_count, 0);
        }

        tokio::time::sleep(Duration::from_secs(6)).await;
        {
            let snapshot = state.borrow();
            assert_eq!(snapshot.consecutive_failures, 0);
            assert_eq!(snapshot.message_count, 1);
            assert!(snapshot.last_latency_ms.is_some());
        }

        shutdown.cancel();
        let final_state = handle.await.unwrap();
        assert_eq!(final_state.status, SessionStatus::Closed);
        assert_eq!(stats.snapshot().total_errors, 3);
        assert_eq!(stats.snapshot().total_messages, 1);
        assert_eq!(connector.open_handles(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_pong_forces_backoff() {
        let connector = MockConnector::new(vec![MockAttempt::Accept(Vec::new())]).without_auto_pong();
        let (session, stats, mut events, shutdown) =
            session_with(connector.clone(), SessionSettings::default());
        let state = session.subscribe();
        let handle = tokio::spawn(session.run());

        let disconnected = loop {
            match events.recv().await.unwrap() {
                event @ ProbeEvent::Disconnected { .. } => break event,
                _ => continue,
            }
        };
        match disconnected {
            ProbeEvent::Disconnected { kind, connected_for, .. } => {
                assert_eq!(kind, ErrorKind::StaleHeartbeat);
                let up = connected_for.unwrap();
                assert!(up > Duration::from_secs(10) && up <= Duration::from_secs(12), "{up:?}");
            }
            other => panic!("unexpected event {other:?}"),
        }

        assert!(matches!(
            events.recv().await.unwrap(),
            ProbeEvent::Reconnecting { cause: ErrorKind::StaleHeartbeat, attempt: 1, .. }
        ));
        assert_eq!(state.borrow().status, SessionStatus::Backoff);
        assert_eq!(stats.snapshot().total_reconnects, 1);
        assert_eq!(stats.snapshot().total_errors, 0);
        assert!(connector.pings_received() >= 1);

        shutdown.cancel();
        handle.await.unwrap();
        assert_eq!(connector.open_handles(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pongs_keep_connection_alive() {
        let connector = MockConnector::new(vec![MockAttempt::Accept(Vec::new())]);
        let (session, stats, _events, shutdown) =
            session_with(connector.clone(), SessionSettings::default());
        let state = session.subscribe();
        let handle = tokio::spawn(session.run());

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(state.borrow().status, SessionStatus::Streaming);
        assert_eq!(stats.snapshot().total_reconnects, 0);
        assert!(stats.snapshot().pongs_received >= 5);
        assert_eq!(connector.connect_attempts(), 1);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn parse_errors_are_skipped_and_close_frames_back_off() {
        let connector = MockConnector::new(vec![MockAttempt::Accept(vec![
            MockStep::Frame(Frame::Text("{\"result\":null,\"id\":1}".to_string())),
            kline_step(10),
            MockStep::Frame(Frame::Ping(Vec::new())),
            MockStep::Frame(Frame::Close {
                code: Some(1008),
                reason: "too many requests".to_string(),
            }),
        ])]);
        let (session, stats, mut events, shutdown) =
            session_with(connector.clone(), SessionSettings::default());
        let handle = tokio::spawn(session.run());

        let mut seen = Vec::new();
        loop {
            let event = events.recv().await.unwrap();
            let done = matches!(event, ProbeEvent::Reconnecting { .. });
            seen.push(event);
            if done {
                break;
            }
        }

        assert!(seen.iter().any(|event| matches!(
            event,
            ProbeEvent::Error { kind: ErrorKind::Parse, .. }
        )));
        assert!(seen.iter().any(|event| matches!(
            event,
            ProbeEvent::Disconnected { kind: ErrorKind::ConnectionClosed, .. }
        )));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_messages, 1);
        assert_eq!(snapshot.parse_errors, 1);
        assert_eq!(snapshot.pings_received, 1);
        assert_eq!(snapshot.total_reconnects, 1);
        assert_eq!(snapshot.total_errors, 0);

        shutdown.cancel();
        let final_state = handle.await.unwrap();
        assert_eq!(final_state.message_count, 1);
        assert_eq!(connector.open_handles(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn message_batches_are_reported_every_n() {
        let steps = (0..7).map(kline_step).collect();
        let connector = MockConnector::new(vec![MockAttempt::Accept(steps)]);
        let settings = SessionSettings {
            message_log_every: 3,
            ..SessionSettings::default()
        };
        let (session, _stats, mut events, shutdown) = session_with(connector, settings);
        let handle = tokio::spawn(session.run());

        tokio::time::sleep(Duration::from_secs(1)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let mut batches = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let ProbeEvent::MessageBatch { count, .. } = event {
                batches.push(count);
            }
        }
        assert_eq!(batches, vec![3, 6]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_backoff_promptly() {
        let connector = MockConnector::new(vec![MockAttempt::ProxyReject(407)]);
        let (session, stats, mut events, shutdown) =
            session_with(connector, SessionSettings::default());
        let state = session.subscribe();
        let handle = tokio::spawn(session.run());

        assert!(matches!(
            events.recv().await.unwrap(),
            ProbeEvent::Error { kind: ErrorKind::Proxy, .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            ProbeEvent::Reconnecting { .. }
        ));
        assert_eq!(state.borrow().status, SessionStatus::Backoff);
        assert_eq!(stats.snapshot().total_errors, 1);

        let started = Instant::now();
        shutdown.cancel();
        let final_state = handle.await.unwrap();
        assert_eq!(final_state.status, SessionStatus::Closed);
        assert!(started.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn wire_event_time_at_i64_min_keeps_streaming() {
        let connector = MockConnector::new(vec![MockAttempt::Accept(vec![kline_step(i64::MIN)])]);
        let (session, stats, _events, shutdown) =
            session_with(connector.clone(), SessionSettings::default());
        let state = session.subscribe();
        let handle = tokio::spawn(session.run());

        tokio::time::sleep(Duration::from_secs(1)).await;
        {
            let snapshot = state.borrow();
            assert_eq!(snapshot.status, SessionStatus::Streaming);
            assert_eq!(snapshot.message_count, 1);
            assert_eq!(snapshot.last_latency_ms, Some(i64::MAX));
        }

        shutdown.cancel();
        let final_state = handle.await.unwrap();
        assert_eq!(final_state.status, SessionStatus::Closed);
        assert_eq!(stats.snapshot().total_messages, 1);
        assert_eq!(connector.open_handles(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_ping_send_counts_as_stale_heartbeat() {
        let connector = MockConnector::new(vec![MockAttempt::Accept(Vec::new())]).with_stalled_sends();
        let (session, stats, mut events, shutdown) =
            session_with(connector.clone(), SessionSettings::default());
        let handle = tokio::spawn(session.run());

        let started = Instant::now();
        let kind = loop {
            if let ProbeEvent::Disconnected { kind, .. } = events.recv().await.unwrap() {
                break kind;
            }
        };
        assert_eq!(kind, ErrorKind::StaleHeartbeat);
        assert!(started.elapsed() <= Duration::from_secs(11), "{:?}", started.elapsed());
        assert_eq!(stats.snapshot().total_reconnects, 1);

        shutdown.cancel();
        handle.await.unwrap();
        assert_eq!(connector.open_handles(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_stalled_ping_send() {
        let connector = MockConnector::new(vec![MockAttempt::Accept(Vec::new())]).with_stalled_sends();
        let (session, _stats, mut events, shutdown) =
            session_with(connector.clone(), SessionSettings::default());
        let handle = tokio::spawn(session.run());

        assert!(matches!(events.recv().await.unwrap(), ProbeEvent::Connected { .. }));
        tokio::time::sleep(Duration::from_secs(1)).await;

        let started = Instant::now();
        shutdown.cancel();
        let final_state = handle.await.unwrap();
        assert_eq!(final_state.status, SessionStatus::Closed);
        assert!(started.elapsed() < Duration::from_millis(10));
        assert_eq!(connector.open_handles(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn configuration_errors_stop_without_retry() {
        let connector = MockConnector::new(vec![MockAttempt::Misconfigured(
            "invalid url".to_string(),
        )]);
        let (session, stats, mut events, _shutdown) =
            session_with(connector.clone(), SessionSettings::default());
        let handle = tokio::spawn(session.run());

        let final_state = handle.await.unwrap();
        assert_eq!(final_state.status, SessionStatus::Closed);
        assert_eq!(final_state.consecutive_failures, 1);
        assert_eq!(stats.snapshot().total_errors, 1);
        assert_eq!(connector.connect_attempts(), 1);

        assert!(matches!(
            events.recv().await.unwrap(),
            ProbeEvent::Error { kind: ErrorKind::Config, .. }
        ));
        while let Ok(event) = events.try_recv() {
            assert!(!matches!(event, ProbeEvent::Reconnecting { .. }), "{event:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn payload_read_errors_stay_on_the_stream() {
        let connector = MockConnector::new(vec![MockAttempt::Accept(vec![
            MockStep::Garbled("invalid utf-8 in text frame".to_string()),
            kline_step(10),
        ])]);
        let (session, stats, _events, shutdown) =
            session_with(connector.clone(), SessionSettings::default());
        let state = session.subscribe();
        let handle = tokio::spawn(session.run());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(state.borrow().status, SessionStatus::Streaming);
        assert_eq!(state.borrow().message_count, 1);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.parse_errors, 1);
        assert_eq!(snapshot.total_reconnects, 0);
        assert_eq!(connector.connect_attempts(), 1);

        shutdown.cancel();
        handle.await.unwrap();
    }

    fn kline_step(event_time: i64) -> MockStep {
        MockStep::Frame(kline(event_time))
    }
}
