/*
[INPUT]:  Test scenarios needing a live socket peer
[OUTPUT]: Local WebSocket servers and fake HTTP CONNECT proxies
[POS]:    Test infrastructure - shared across adapter integration tests
[UPDATE]: When adding new socket-level fixtures
*/

//! Common test utilities for ws-probe-adapter tests

use std::future::Future;
use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{WebSocketStream, accept_async};

/// Accept one WebSocket client on an ephemeral port and hand it to `handler`
#[allow(dead_code)]
pub async fn spawn_ws_server<F, Fut>(handler: F) -> SocketAddr
where
    F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        handler(ws).await;
    });
    addr
}

/// Fake proxy that answers the CONNECT request with `status_line`.
///
/// On a 2xx answer the proxy itself plays the WebSocket server through the tunnel.
#[allow(dead_code)]
pub async fn spawn_proxy<F, Fut>(status_line: &'static str, handler: F) -> SocketAddr
where
    F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let head = read_head(&mut stream).await;
        assert!(head.starts_with("CONNECT "), "unexpected proxy request: {head}");

        stream.write_all(status_line.as_bytes()).await.unwrap();
        if !status_line.starts_with("HTTP/1.1 2") {
            return;
        }

        let ws = accept_async(stream).await.unwrap();
        handler(ws).await;
    });
    addr
}

/// Proxy that accepts the TCP connection and never answers
#[allow(dead_code)]
pub async fn spawn_silent_proxy() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        std::future::pending::<()>().await;
        drop(stream);
    });
    addr
}

async fn read_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        let read = stream.read(&mut byte).await.unwrap();
        if read == 0 {
            break;
        }
        head.push(byte[0]);
    }
    String::from_utf8_lossy(&head).into_owned()
}
