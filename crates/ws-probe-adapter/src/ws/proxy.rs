/*
[INPUT]:  Proxy host:port, target host:port, handshake timeout
[OUTPUT]: TCP stream tunnelled through an HTTP CONNECT proxy
[POS]:    Transport layer - proxy tunnelling before the WebSocket upgrade
[UPDATE]: When changing CONNECT request headers or response handling
*/

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

use super::ProxyConfig;
use crate::error::{ProbeError, Result};

const MAX_RESPONSE_HEAD_BYTES: usize = 8 * 1024;

/// Establish a CONNECT tunnel to `target_host:target_port` through `proxy`.
///
/// Any non-2xx status, malformed response or timeout fails with [`ProbeError::Proxy`].
pub async fn open_tunnel(
    proxy: &ProxyConfig,
    target_host: &str,
    target_port: u16,
    timeout: Duration,
) -> Result<TcpStream> {
    let handshake = async {
        let mut stream = TcpStream::connect((proxy.host.as_str(), proxy.port))
            .await
            .map_err(|err| ProbeError::Proxy {
                status: None,
                message: format!("connect to proxy {}:{} failed: {err}", proxy.host, proxy.port),
            })?;

        let request = format!(
            "CONNECT {target_host}:{target_port} HTTP/1.1\r\n\
             Host: {target_host}:{target_port}\r\n\
             Proxy-Connection: Keep-Alive\r\n\r\n"
        );
        stream
            .write_all(request.as_bytes())
            .await
            .map_err(|err| ProbeError::Proxy {
                status: None,
                message: format!("write CONNECT request failed: {err}"),
            })?;

        let head = read_response_head(&mut stream).await?;
        let (status, reason) = parse_status_line(&head)?;
        debug!(status, reason = %reason, "proxy CONNECT response");

        if !(200..300).contains(&status) {
            return Err(ProbeError::proxy_status(status, reason));
        }

        info!(
            proxy = %format!("{}:{}", proxy.host, proxy.port),
            target = %format!("{target_host}:{target_port}"),
            "proxy tunnel established"
        );
        Ok(stream)
    };

    tokio::time::timeout(timeout, handshake)
        .await
        .map_err(|_| ProbeError::Proxy {
            status: None,
            message: format!("CONNECT handshake timed out after {}ms", timeout.as_millis()),
        })?
}

/// Read up to and including the blank line ending the response head.
///
/// Reads byte-wise so no tunnelled bytes are consumed past the head.
async fn read_response_head(stream: &mut TcpStream) -> Result<String> {
    let mut head = Vec::with_capacity(256);
    let mut byte = [0u8; 1];

    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= MAX_RESPONSE_HEAD_BYTES {
            return Err(ProbeError::Proxy {
                status: None,
                message: "CONNECT response head too large".to_string(),
            });
        }
        let read = stream
            .read(&mut byte)
            .await
            .map_err(|err| ProbeError::Proxy {
                status: None,
                message: format!("read CONNECT response failed: {err}"),
            })?;
        if read == 0 {
            return Err(ProbeError::Proxy {
                status: None,
                message: "proxy closed connection during CONNECT".to_string(),
            });
        }
        head.push(byte[0]);
    }

    Ok(String::from_utf8_lossy(&head).into_owned())
}

/// Parse `HTTP/1.x <code> <reason>` from the first response line
fn parse_status_line(head: &str) -> Result<(u16, String)> {
    let line = head.lines().next().unwrap_or_default();
    let mut parts = line.splitn(3, ' ');

    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(ProbeError::Proxy {
            status: None,
            message: format!("malformed CONNECT status line: {line}"),
        });
    }

    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| ProbeError::Proxy {
            status: None,
            message: format!("malformed CONNECT status line: {line}"),
        })?;
    let reason = parts.next().unwrap_or_default().trim().to_string();

    Ok((status, reason))
}
