// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Transport Adapters
//!
//! Move raw goal-state bytes between a socket and the communication manager.
//! The manager never sees sockets; adapters never look inside payloads.
//!
//! | Protocol | Server | Client | Framing |
//! |----------|--------|--------|---------|
//! | UDP | [`UdpServerTransport`] | [`UdpClientTransport`] | one datagram per message |
//! | TCP | [`TcpServerTransport`] | [`TcpClientTransport`] | 4-byte big-endian length prefix |
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Socket I/O for the agent (server) and the push client

pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::agent_config::{TransportConfig, TransportProtocol};

pub use tcp::{TcpClientTransport, TcpServerTransport};
pub use udp::{UdpClientTransport, UdpServerTransport};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to resolve {address}: {reason}")]
    Resolve { address: String, reason: String },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        source: std::io::Error,
    },

    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: SocketAddr,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no pending request to reply to")]
    NoPeer,

    #[error("message of {size} bytes exceeds the {max} byte transport limit")]
    MessageTooLarge { size: usize, max: usize },

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("timed out waiting for a reply")]
    Timeout,
}

/// Byte-level boundary between a socket and the communication manager
#[async_trait]
pub trait TransportAdapter: Send {
    /// Wait for the next complete message
    async fn receive(&mut self) -> Result<Bytes, TransportError>;

    /// Send a message; servers reply to the sender of the last received message
    async fn send(&mut self, payload: Bytes) -> Result<(), TransportError>;

    fn local_addr(&self) -> Result<SocketAddr, TransportError>;
}

/// Resolve `address:port`, preferring the first address returned by the resolver.
pub async fn resolve(address: &str, port: u16) -> Result<SocketAddr, TransportError> {
    let mut candidates = tokio::net::lookup_host((address, port))
        .await
        .map_err(|e| TransportError::Resolve {
            address: format!("{}:{}", address, port),
            reason: e.to_string(),
        })?;

    candidates.next().ok_or_else(|| TransportError::Resolve {
        address: format!("{}:{}", address, port),
        reason: "no addresses returned".to_string(),
    })
}

/// Bind the agent-side transport described by `config`.
pub async fn bind_server(config: &TransportConfig) -> Result<Box<dyn TransportAdapter>, TransportError> {
    let address = resolve(&config.server_address, config.port).await?;
    let transport: Box<dyn TransportAdapter> = match config.protocol {
        TransportProtocol::Udp => Box::new(UdpServerTransport::bind(address, config.max_payload_bytes).await?),
        TransportProtocol::Tcp => Box::new(TcpServerTransport::bind(address, config.max_payload_bytes).await?),
    };
    Ok(transport)
}

/// Connect a controller-side client to the agent described by `config`.
pub async fn connect_client(config: &TransportConfig) -> Result<Box<dyn TransportAdapter>, TransportError> {
    let address = resolve(&config.server_address, config.port).await?;
    let transport: Box<dyn TransportAdapter> = match config.protocol {
        TransportProtocol::Udp => Box::new(UdpClientTransport::connect(address).await?),
        TransportProtocol::Tcp => Box::new(TcpClientTransport::connect(address, config.max_payload_bytes).await?),
    };
    Ok(transport)
}

/// Send one request and wait at most `timeout` for its reply.
pub async fn request(
    transport: &mut dyn TransportAdapter,
    payload: Bytes,
    timeout: Duration,
) -> Result<Bytes, TransportError> {
    transport.send(payload).await?;
    tokio::time::timeout(timeout, transport.receive())
        .await
        .map_err(|_| TransportError::Timeout)?
}
