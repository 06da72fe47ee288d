/*
[INPUT]:  Stream URL, proxy settings, handshake timeout
[OUTPUT]: WsConnection handles over tokio-tungstenite with auto-pong
[POS]:    Transport layer - concrete WebSocket connector
[UPDATE]: When changing TLS, handshake or frame mapping
*/

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, client_async_tls_with_config, connect_async,
};
use tracing::{debug, info};
use url::Url;

use super::{Connector, Frame, FrameStream, ProxyConfig, proxy};
use crate::endpoint;
use crate::error::{ProbeError, Result};

const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector that dials the endpoint directly or through an HTTP CONNECT proxy
#[derive(Debug, Clone)]
pub struct WsConnector {
    proxy: ProxyConfig,
    handshake_timeout: Duration,
}

impl WsConnector {
    pub fn new(proxy: ProxyConfig) -> Self {
        Self {
            proxy,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn proxy(&self) -> &ProxyConfig {
        &self.proxy
    }

    async fn open(&self, url: &Url) -> Result<WsStream> {
        if self.proxy.enabled {
            let (host, port) = endpoint::authority(url)?;
            let tunnel =
                proxy::open_tunnel(&self.proxy, &host, port, self.handshake_timeout).await?;
            let (ws, response) = tokio::time::timeout(
                self.handshake_timeout,
                client_async_tls_with_config(url.as_str(), tunnel, None, None),
            )
            .await
            .map_err(|_| handshake_timeout(self.handshake_timeout))?
            .map_err(connect_error)?;
            debug!(status = %response.status(), "websocket upgrade via proxy");
            Ok(ws)
        } else {
            let (ws, response) =
                tokio::time::timeout(self.handshake_timeout, connect_async(url.as_str()))
                    .await
                    .map_err(|_| handshake_timeout(self.handshake_timeout))?
                    .map_err(connect_error)?;
            debug!(status = %response.status(), "websocket upgrade");
            Ok(ws)
        }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn FrameStream>> {
        let ws = self.open(url).await?;
        info!(url = %url, via_proxy = self.proxy.enabled, "websocket connected");
        Ok(Box::new(WsConnection::new(url.clone(), ws)))
    }
}

/// One live WebSocket; replaced on every reconnect, never reused
pub struct WsConnection {
    url: Url,
    inner: WsStream,
    closed: bool,
}

impl WsConnection {
    fn new(url: Url, inner: WsStream) -> Self {
        Self {
            url,
            inner,
            closed: false,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl FrameStream for WsConnection {
    async fn recv(&mut self) -> Option<Result<Frame>> {
        if self.closed {
            return None;
        }

        loop {
            let message = match self.inner.next().await {
                Some(Ok(message)) => message,
                Some(Err(err)) => {
                    self.closed = true;
                    return Some(Err(stream_error(err)));
                }
                None => {
                    self.closed = true;
                    return None;
                }
            };

            let frame = match message {
                WsMessage::Text(text) => Frame::Text(text.to_string()),
                WsMessage::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => Frame::Text(text),
                    Err(_) => {
                        debug!(bytes = bytes.len(), "skipping non-utf8 binary frame");
                        continue;
                    }
                },
                WsMessage::Ping(payload) => {
                    // tungstenite queues the pong reply on read; push it out now.
                    if let Err(err) = self.inner.flush().await {
                        self.closed = true;
                        return Some(Err(stream_error(err)));
                    }
                    Frame::Ping(payload.to_vec())
                }
                WsMessage::Pong(payload) => Frame::Pong(payload.to_vec()),
                WsMessage::Close(close) => {
                    let (code, reason) = close
                        .map(|frame| (Some(u16::from(frame.code)), frame.reason.to_string()))
                        .unwrap_or((None, String::new()));
                    Frame::Close { code, reason }
                }
                WsMessage::Frame(_) => continue,
            };

            return Some(Ok(frame));
        }
    }

    async fn send(&mut self, frame: Frame) -> Result<()> {
        if self.closed {
            return Err(ProbeError::closed(None, "send on closed connection"));
        }

        let message = match frame {
            Frame::Text(text) => WsMessage::Text(text.into()),
            Frame::Ping(payload) => WsMessage::Ping(payload.into()),
            Frame::Pong(payload) => WsMessage::Pong(payload.into()),
            Frame::Close { code, reason } => WsMessage::Close(Some(CloseFrame {
                code: code.map(CloseCode::from).unwrap_or(CloseCode::Normal),
                reason: reason.into(),
            })),
        };

        self.inner.send(message).await.map_err(|err| {
            self.closed = true;
            stream_error(err)
        })
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(err) = self.inner.close(None).await {
            debug!(url = %self.url, error = %err, "websocket close returned error");
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

fn handshake_timeout(timeout: Duration) -> ProbeError {
    ProbeError::Connect(format!(
        "websocket handshake timed out after {}ms",
        timeout.as_millis()
    ))
}

fn connect_error(err: WsError) -> ProbeError {
    match err {
        WsError::Http(response) => ProbeError::Connect(format!(
            "websocket upgrade rejected with HTTP {}",
            response.status()
        )),
        WsError::Protocol(err) => ProbeError::Protocol(err.to_string()),
        other => ProbeError::Connect(other.to_string()),
    }
}

fn stream_error(err: WsError) -> ProbeError {
    match err {
        WsError::ConnectionClosed | WsError::AlreadyClosed => {
            ProbeError::closed(None, "connection closed")
        }
        WsError::Io(err) => ProbeError::closed(None, err.to_string()),
        WsError::Protocol(err) => ProbeError::Protocol(err.to_string()),
        other => ProbeError::Protocol(other.to_string()),
    }
}
