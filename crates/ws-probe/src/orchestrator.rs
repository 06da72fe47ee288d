/*
[INPUT]:  Validated RunConfig, Connector, OS shutdown via CancellationToken
[OUTPUT]: One running session per symbol plus periodic symbol/global reports
[POS]:    Supervision layer - spawns sessions and reporters, bounded shutdown
[UPDATE]: When changing startup order, reporting cadence or shutdown guarantees
*/

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use ws_probe_adapter::{Connector, kline_stream_url};

use crate::backoff::BackoffPolicy;
use crate::config::RunConfig;
use crate::events::{EventSink, ProbeEvent};
use crate::session::{
    SessionContext, SessionSettings, SessionStatus, SubscriptionSession, SubscriptionState,
};
use crate::stats::{GlobalStats, StatsSnapshot};

struct ManagedSession {
    symbol: String,
    handle: JoinHandle<SubscriptionState>,
}

/// Owns every subscription session of a probe run.
///
/// Session failures never reach here; only configuration errors and
/// shutdown problems surface as `Err`.
pub struct Orchestrator {
    config: RunConfig,
    connector: Arc<dyn Connector>,
    stats: Arc<GlobalStats>,
    events: EventSink,
    shutdown: CancellationToken,
    sessions: Vec<ManagedSession>,
    states: Vec<watch::Receiver<SubscriptionState>>,
    reporters: Vec<JoinHandle<()>>,
}

impl Orchestrator {
    pub fn new(config: RunConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        let config = config.validated().context("invalid configuration")?;
        Ok(Self {
            config,
            connector,
            stats: Arc::new(GlobalStats::new()),
            events: EventSink::new(),
            shutdown: CancellationToken::new(),
            sessions: Vec::new(),
            states: Vec::new(),
            reporters: Vec::new(),
        })
    }

    /// Route events to an additional observer besides the log
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn stats(&self) -> Arc<GlobalStats> {
        self.stats.clone()
    }

    /// Spawn one session per symbol and the two periodic reporters
    pub fn start(&mut self) -> Result<()> {
        if !self.sessions.is_empty() {
            bail!("orchestrator already started");
        }

        let ctx = SessionContext {
            connector: self.connector.clone(),
            stats: self.stats.clone(),
            events: self.events.clone(),
            policy: BackoffPolicy::from_config(&self.config.backoff),
            settings: SessionSettings::from_config(&self.config),
        };

        for symbol in &self.config.symbols {
            let url = kline_stream_url(&self.config.endpoint, symbol, &self.config.interval)
                .with_context(|| format!("build stream url symbol={symbol}"))?;
            let session =
                SubscriptionSession::new(symbol, url, ctx.clone(), self.shutdown.child_token());
            self.states.push(session.subscribe());
            self.sessions.push(ManagedSession {
                symbol: symbol.clone(),
                handle: tokio::spawn(session.run()),
            });
        }

        self.reporters.push(tokio::spawn(run_symbol_reporter(
            self.config.report.symbol_interval(),
            self.states.clone(),
            self.events.clone(),
            self.shutdown.clone(),
        )));
        self.reporters.push(tokio::spawn(run_global_reporter(
            self.config.report.global_interval(),
            self.states.clone(),
            self.stats.clone(),
            self.events.clone(),
            self.shutdown.clone(),
        )));

        info!(
            symbols = ?self.config.symbols,
            interval = %self.config.interval,
            proxy = self.config.proxy.enabled,
            "sessions started"
        );
        Ok(())
    }

    /// Latest snapshot of every session, in symbol order
    pub fn session_states(&self) -> Vec<SubscriptionState> {
        current_states(&self.states)
    }

    /// Block until the shutdown token fires, then stop everything
    pub async fn run_until_shutdown(&mut self) -> Result<Vec<SubscriptionState>> {
        self.shutdown.cancelled().await;
        self.shutdown_and_wait().await
    }

    /// Request graceful shutdown and wait for sessions and reporters to exit.
    ///
    /// Bounded by `shutdown_timeout`; anything still running then is aborted.
    pub async fn shutdown_and_wait(&mut self) -> Result<Vec<SubscriptionState>> {
        self.shutdown.cancel();
        let timeout = self.config.shutdown_timeout();
        let states = self.join_all_with_deadline(timeout).await?;

        self.events.emit(global_report(self.stats.snapshot(), &states));
        Ok(states)
    }

    async fn join_all_with_deadline(&mut self, timeout: Duration) -> Result<Vec<SubscriptionState>> {
        let deadline = Instant::now() + timeout;

        let mut sessions: Vec<ManagedSession> = std::mem::take(&mut self.sessions);
        sessions.reverse();
        let mut reporters = std::mem::take(&mut self.reporters);
        let mut finished = Vec::with_capacity(sessions.len());

        while let Some(session) = sessions.pop() {
            let symbol = session.symbol;
            let mut handle = session.handle;
            let sleep = sleep_until_deadline(deadline);

            tokio::select! {
                res = &mut handle => match res {
                    Ok(state) => {
                        debug!(%symbol, messages = state.message_count, "session joined");
                        finished.push(state);
                    }
                    Err(join_err) => {
                        abort_all(sessions, reporters);
                        if join_err.is_panic() {
                            return Err(anyhow!("session panicked symbol={symbol}: {join_err}"));
                        }
                        return Err(anyhow!("session join error symbol={symbol}: {join_err}"));
                    }
                },
                _ = sleep => {
                    handle.abort();
                    abort_all(sessions, reporters);
                    return Err(anyhow!("shutdown timed out after {timeout:?}"));
                }
            }
        }

        while let Some(mut handle) = reporters.pop() {
            let sleep = sleep_until_deadline(deadline);
            tokio::select! {
                res = &mut handle => {
                    if let Err(join_err) = res {
                        abort_all(Vec::new(), reporters);
                        return Err(anyhow!("reporter join error: {join_err}"));
                    }
                }
                _ = sleep => {
                    handle.abort();
                    abort_all(Vec::new(), reporters);
                    return Err(anyhow!("shutdown timed out after {timeout:?}"));
                }
            }
        }

        Ok(finished)
    }
}

/// Per-symbol reports for every session that has received data
pub fn symbol_reports(states: &[SubscriptionState], now: DateTime<Utc>) -> Vec<ProbeEvent> {
    states
        .iter()
        .filter_map(|state| {
            let payload = state.last_payload.as_ref()?;
            let data_age = state
                .last_message_at
                .and_then(|at| (now - at).to_std().ok());
            Some(ProbeEvent::PeriodicSymbolReport {
                symbol: state.symbol.clone(),
                summary: payload.summary(),
                latency_ms: state.last_latency_ms,
                data_age,
            })
        })
        .collect()
}

/// Process-wide counters plus how many sessions are currently streaming
pub fn global_report(snapshot: StatsSnapshot, states: &[SubscriptionState]) -> ProbeEvent {
    let streaming = states
        .iter()
        .filter(|state| state.status == SessionStatus::Streaming)
        .count();
    ProbeEvent::PeriodicGlobalReport {
        snapshot,
        symbols: states.len(),
        streaming,
    }
}

fn current_states(receivers: &[watch::Receiver<SubscriptionState>]) -> Vec<SubscriptionState> {
    receivers.iter().map(|rx| rx.borrow().clone()).collect()
}

async fn run_symbol_reporter(
    period: Duration,
    states: Vec<watch::Receiver<SubscriptionState>>,
    events: EventSink,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                for event in symbol_reports(&current_states(&states), Utc::now()) {
                    events.emit(event);
                }
            }
        }
    }
}

async fn run_global_reporter(
    period: Duration,
    states: Vec<watch::Receiver<SubscriptionState>>,
    stats: Arc<GlobalStats>,
    events: EventSink,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                events.emit(global_report(stats.snapshot(), &current_states(&states)));
            }
        }
    }
}

fn sleep_until_deadline(deadline: Instant) -> Sleep {
    tokio::time::sleep_until(deadline)
}

fn abort_all(sessions: Vec<ManagedSession>, reporters: Vec<JoinHandle<()>>) {
    for session in sessions {
        session.handle.abort();
    }
    for handle in reporters {
        handle.abort();
    }
}
