/*
[INPUT]:  Public API exports for ws-probe crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod backoff;
pub mod config;
pub mod events;
pub mod orchestrator;
pub mod session;
pub mod stats;

// Re-export main types for convenience
pub use backoff::BackoffPolicy;
pub use config::{LogLevel, RunConfig};
pub use events::{EventSink, ProbeEvent};
pub use orchestrator::Orchestrator;
pub use session::{SessionStatus, SubscriptionSession, SubscriptionState};
pub use stats::{GlobalStats, StatsSnapshot};
