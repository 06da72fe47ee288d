/*
[INPUT]:  Stream URL and optional HTTP CONNECT proxy settings
[OUTPUT]: Connection handles yielding Text/Ping/Pong/Close frames
[POS]:    Transport layer - WebSocket connection seam
[UPDATE]: When adding frame kinds or changing the connector contract
*/

pub mod client;
pub mod mock;
pub mod proxy;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

pub use client::{WsConnection, WsConnector};
pub use mock::{MockAttempt, MockConnector, MockStep};

/// Frame kinds surfaced to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close { code: Option<u16>, reason: String },
}

/// HTTP CONNECT proxy settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_proxy_host")]
    pub host: String,
    #[serde(default = "default_proxy_port")]
    pub port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_proxy_host(),
            port: default_proxy_port(),
        }
    }
}

fn default_proxy_host() -> String {
    "192.168.8.66".to_string()
}

fn default_proxy_port() -> u16 {
    6152
}

/// A live connection owned by exactly one session.
///
/// `recv` returns `None` once the socket is gone; `close` is idempotent.
#[async_trait]
pub trait FrameStream: Send {
    async fn recv(&mut self) -> Option<Result<Frame>>;

    async fn send(&mut self, frame: Frame) -> Result<()>;

    async fn close(&mut self);

    fn is_closed(&self) -> bool;
}

/// Opens fresh connections; a new handle is created for every (re)connect.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<Box<dyn FrameStream>>;
}
