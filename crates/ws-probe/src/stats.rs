/*
[INPUT]:  Increments from every subscription session
[OUTPUT]: Point-in-time StatsSnapshot for the periodic global report
[POS]:    Shared runtime counters between session tasks and the reporter
[UPDATE]: When adding/removing process-wide counters
*/

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// Process-wide counters shared by all sessions.
///
/// Each counter is independent; increments never lose updates under contention.
#[derive(Debug)]
pub struct GlobalStats {
    total_messages: AtomicU64,
    total_reconnects: AtomicU64,
    total_errors: AtomicU64,
    parse_errors: AtomicU64,
    pings_received: AtomicU64,
    pongs_received: AtomicU64,
    started_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub total_messages: u64,
    pub total_reconnects: u64,
    pub total_errors: u64,
    pub parse_errors: u64,
    pub pings_received: u64,
    pub pongs_received: u64,
    pub uptime: Duration,
}

impl GlobalStats {
    pub fn new() -> Self {
        Self {
            total_messages: AtomicU64::new(0),
            total_reconnects: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            pings_received: AtomicU64::new(0),
            pongs_received: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn increment_messages(&self) {
        self.total_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reconnects(&self) {
        self.total_reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_parse_errors(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_pings(&self) {
        self.pings_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_pongs(&self) {
        self.pongs_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_messages: self.total_messages.load(Ordering::Relaxed),
            total_reconnects: self.total_reconnects.load(Ordering::Relaxed),
            total_errors: self.total_errors.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            pings_received: self.pings_received.load(Ordering::Relaxed),
            pongs_received: self.pongs_received.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

impl Default for GlobalStats {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSnapshot {
    /// Average messages per minute since start
    pub fn messages_per_minute(&self) -> f64 {
        let minutes = self.uptime.as_secs_f64() / 60.0;
        if minutes <= 0.0 {
            return 0.0;
        }
        self.total_messages as f64 / minutes
    }
}

/// `1h 2m 3s`
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours}h {minutes}m {seconds}s")
}
