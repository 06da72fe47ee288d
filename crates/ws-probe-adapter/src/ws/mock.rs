/*
[INPUT]:  Scripted connect outcomes and per-connection frame steps
[OUTPUT]: In-memory Connector/FrameStream for driving sessions without a network
[POS]:    Transport layer - test double
[UPDATE]: When the Connector or FrameStream contract changes
*/

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use url::Url;

use super::{Connector, Frame, FrameStream};
use crate::error::{ProbeError, Result};

/// One step of a scripted connection
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Deliver this frame
    Frame(Frame),
    /// Deliver nothing for this long
    Wait(Duration),
    /// Fail the read with a transport-level close
    Reset(String),
    /// Fail the read with a payload error; the connection stays usable
    Garbled(String),
    /// End the frame sequence (socket gone)
    End,
}

/// Outcome of one connect attempt
#[derive(Debug, Clone)]
pub enum MockAttempt {
    Refuse(String),
    ProxyReject(u16),
    /// Fail with a non-retryable configuration error
    Misconfigured(String),
    Accept(Vec<MockStep>),
}

#[derive(Debug, Default)]
struct Counters {
    connect_attempts: AtomicU64,
    open_handles: AtomicUsize,
    pings_received: AtomicU64,
}

/// Connector that plays back a script of attempts.
///
/// Once the script is exhausted every further attempt is accepted as an idle
/// connection. Pings sent by the caller are answered with pongs unless
/// `auto_pong` is disabled. With stalled sends every `send` pends forever,
/// like a peer that stopped reading.
#[derive(Debug, Clone)]
pub struct MockConnector {
    attempts: Arc<Mutex<VecDeque<MockAttempt>>>,
    counters: Arc<Counters>,
    auto_pong: bool,
    stall_sends: bool,
}

impl MockConnector {
    pub fn new(attempts: Vec<MockAttempt>) -> Self {
        Self {
            attempts: Arc::new(Mutex::new(attempts.into())),
            counters: Arc::new(Counters::default()),
            auto_pong: true,
            stall_sends: false,
        }
    }

    pub fn without_auto_pong(mut self) -> Self {
        self.auto_pong = false;
        self
    }

    pub fn with_stalled_sends(mut self) -> Self {
        self.stall_sends = true;
        self
    }

    pub fn connect_attempts(&self) -> u64 {
        self.counters.connect_attempts.load(Ordering::SeqCst)
    }

    /// Connections handed out and not yet closed or dropped
    pub fn open_handles(&self) -> usize {
        self.counters.open_handles.load(Ordering::SeqCst)
    }

    pub fn pings_received(&self) -> u64 {
        self.counters.pings_received.load(Ordering::SeqCst)
    }

    fn next_attempt(&self) -> MockAttempt {
        let mut attempts = match self.attempts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        attempts
            .pop_front()
            .unwrap_or_else(|| MockAttempt::Accept(Vec::new()))
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _url: &Url) -> Result<Box<dyn FrameStream>> {
        self.counters.connect_attempts.fetch_add(1, Ordering::SeqCst);

        match self.next_attempt() {
            MockAttempt::Refuse(reason) => Err(ProbeError::Connect(reason)),
            MockAttempt::ProxyReject(status) => {
                Err(ProbeError::proxy_status(status, "rejected by mock proxy"))
            }
            MockAttempt::Misconfigured(reason) => Err(ProbeError::Config(reason)),
            MockAttempt::Accept(steps) => {
                self.counters.open_handles.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(MockConnection {
                    steps: steps.into_iter().map(PendingStep::from).collect(),
                    pending_pongs: VecDeque::new(),
                    auto_pong: self.auto_pong,
                    stall_sends: self.stall_sends,
                    ended: false,
                    closed: false,
                    counters: self.counters.clone(),
                }))
            }
        }
    }
}

#[derive(Debug)]
enum PendingStep {
    Step(MockStep),
    WaitUntil(Instant),
}

impl From<MockStep> for PendingStep {
    fn from(step: MockStep) -> Self {
        PendingStep::Step(step)
    }
}

struct MockConnection {
    steps: VecDeque<PendingStep>,
    pending_pongs: VecDeque<Vec<u8>>,
    auto_pong: bool,
    stall_sends: bool,
    ended: bool,
    closed: bool,
    counters: Arc<Counters>,
}

impl MockConnection {
    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.counters.open_handles.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl FrameStream for MockConnection {
    async fn recv(&mut self) -> Option<Result<Frame>> {
        if self.closed || self.ended {
            return None;
        }
        if let Some(payload) = self.pending_pongs.pop_front() {
            return Some(Ok(Frame::Pong(payload)));
        }

        loop {
            // Wait steps become absolute deadlines so a cancelled read resumes the same wait.
            if let Some(PendingStep::Step(MockStep::Wait(duration))) = self.steps.front() {
                let deadline = Instant::now() + *duration;
                self.steps[0] = PendingStep::WaitUntil(deadline);
            }
            if let Some(PendingStep::WaitUntil(deadline)) = self.steps.front() {
                tokio::time::sleep_until(*deadline).await;
                self.steps.pop_front();
                continue;
            }

            match self.steps.pop_front() {
                Some(PendingStep::Step(MockStep::Frame(frame))) => return Some(Ok(frame)),
                Some(PendingStep::Step(MockStep::Reset(reason))) => {
                    self.ended = true;
                    return Some(Err(ProbeError::closed(None, reason)));
                }
                Some(PendingStep::Step(MockStep::Garbled(detail))) => {
                    return Some(Err(ProbeError::Parse(detail)));
                }
                Some(PendingStep::Step(MockStep::End)) => {
                    self.ended = true;
                    return None;
                }
                Some(_) => continue,
                None => std::future::pending::<()>().await,
            }
        }
    }

    async fn send(&mut self, frame: Frame) -> Result<()> {
        if self.closed || self.ended {
            return Err(ProbeError::closed(None, "send on closed connection"));
        }
        if self.stall_sends {
            std::future::pending::<()>().await;
        }
        if let Frame::Ping(payload) = frame {
            self.counters.pings_received.fetch_add(1, Ordering::SeqCst);
            if self.auto_pong {
                self.pending_pongs.push_back(payload);
            }
        }
        Ok(())
    }

    async fn close(&mut self) {
        self.release();
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.release();
    }
}
