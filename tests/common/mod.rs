//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use rest_bridge::config::{BridgeConfig, CacheBackend};
use rest_bridge::interfaces::{DiscoveryInterface, EchoInterface};
use rest_bridge::net::Listener;
use rest_bridge::routing::Interface;
use rest_bridge::{Server, Shutdown};

/// A parsed response.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Default test config: in-memory uploads.
pub fn test_config() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.cache.backend = CacheBackend::Memory;
    config
}

/// Start a bridge on an ephemeral port serving the built-in interfaces.
pub async fn start_bridge(config: BridgeConfig) -> (SocketAddr, Shutdown) {
    let interfaces: Vec<Arc<dyn Interface>> = vec![Arc::new(DiscoveryInterface::new()), Arc::new(EchoInterface)];
    let server = Server::from_config(&config, &interfaces).unwrap();
    start_server(server).await
}

/// Start an already built server on an ephemeral port.
pub async fn start_server(server: Server) -> (SocketAddr, Shutdown) {
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listener = Listener::from_tcp(tcp, 16);
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let handle = shutdown.clone();
    tokio::spawn(async move {
        server.run(listener, &handle).await.unwrap();
    });
    (addr, shutdown)
}

/// Send raw request bytes and read the whole response.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    parse_response(&String::from_utf8_lossy(&buf))
}

pub fn parse_response(text: &str) -> RawResponse {
    let (head, body) = text
        .split_once("\r\n\r\n")
        .or_else(|| text.split_once("\n\n"))
        .unwrap_or((text, ""));

    let mut lines = head.lines();
    let status_line = lines.next().unwrap_or_default();
    let mut parts = status_line.splitn(3, ' ');
    let _protocol = parts.next();
    let status = parts.next().and_then(|code| code.parse().ok()).unwrap_or(0);
    let reason = parts.next().unwrap_or_default().to_string();

    let headers = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(k, v)| (k.to_string(), v.trim().to_string()))
        .collect();

    RawResponse {
        status,
        reason,
        headers,
        body: body.to_string(),
    }
}
