/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public stream-probe transport crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod endpoint;
pub mod error;
pub mod heartbeat;
pub mod message;
pub mod ws;

pub use endpoint::{DEFAULT_ENDPOINT, kline_stream_url};
pub use error::{ErrorKind, ProbeError, Result};
pub use heartbeat::HeartbeatMonitor;
pub use message::{KlineData, MarketEvent, Payload, TickerData, parse_market_event};

// Re-export commonly used types from ws
pub use ws::{
    Connector,
    Frame,
    FrameStream,
    MockAttempt,
    MockConnector,
    MockStep,
    ProxyConfig,
    WsConnection,
    WsConnector,
};
