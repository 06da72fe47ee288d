/*
[INPUT]:  Ping-sent / pong-received timestamps for one connection
[OUTPUT]: Staleness verdict against a pong timeout
[POS]:    Heartbeat layer - dead-socket detection independent of frame arrival
[UPDATE]: When changing ping/pong bookkeeping or staleness rules
*/

use std::time::Duration;

use tokio::time::Instant;

/// Tracks ping/pong exchange for a single connection.
///
/// Stale means no pong has been observed within `timeout` of the most recent
/// ping, or of connection open if no ping has been sent yet.
#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    opened_at: Instant,
    last_ping: Option<Instant>,
    last_pong: Option<Instant>,
    pings_sent: u64,
    pongs_received: u64,
}

impl HeartbeatMonitor {
    pub fn new(opened_at: Instant) -> Self {
        Self {
            opened_at,
            last_ping: None,
            last_pong: None,
            pings_sent: 0,
            pongs_received: 0,
        }
    }

    pub fn on_ping_sent(&mut self, ts: Instant) {
        self.last_ping = Some(ts);
        self.pings_sent += 1;
    }

    pub fn on_pong_received(&mut self, ts: Instant) {
        self.last_pong = Some(ts);
        self.pongs_received += 1;
    }

    /// Time elapsed since the outstanding ping (or open) with no pong after it
    pub fn awaiting_for(&self, now: Instant) -> Option<Duration> {
        let reference = self.last_ping.unwrap_or(self.opened_at);
        match self.last_pong {
            Some(pong) if pong >= reference => None,
            _ => Some(now.saturating_duration_since(reference)),
        }
    }

    pub fn is_stale(&self, now: Instant, timeout: Duration) -> bool {
        self.awaiting_for(now)
            .is_some_and(|waited| waited > timeout)
    }

    pub fn pings_sent(&self) -> u64 {
        self.pings_sent
    }

    pub fn pongs_received(&self) -> u64 {
        self.pongs_received
    }
}
