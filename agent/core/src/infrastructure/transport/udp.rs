// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! UDP transport: one datagram carries one goal state or one reply.

use async_trait::async_trait;
use bytes::Bytes;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::debug;

use super::{TransportAdapter, TransportError};
use crate::domain::agent_config::MAX_DATAGRAM_BYTES;

/// Agent side: receives from any controller, replies to the last sender
pub struct UdpServerTransport {
    socket: UdpSocket,
    buffer: Vec<u8>,
    peer: Option<SocketAddr>,
}

impl UdpServerTransport {
    pub async fn bind(address: SocketAddr, max_payload_bytes: usize) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(address)
            .await
            .map_err(|source| TransportError::Bind { address, source })?;

        // One spare byte so oversized datagrams reach the manager's size check
        // instead of being silently truncated to the limit.
        let capacity = max_payload_bytes.min(MAX_DATAGRAM_BYTES) + 1;

        Ok(Self {
            socket,
            buffer: vec![0; capacity],
            peer: None,
        })
    }
}

#[async_trait]
impl TransportAdapter for UdpServerTransport {
    async fn receive(&mut self) -> Result<Bytes, TransportError> {
        let (len, peer) = self.socket.recv_from(&mut self.buffer).await?;
        debug!(%peer, bytes = len, "Received datagram");
        self.peer = Some(peer);
        Ok(Bytes::copy_from_slice(&self.buffer[..len]))
    }

    async fn send(&mut self, payload: Bytes) -> Result<(), TransportError> {
        // Checked before the peer is consumed so the caller can still reply
        // with something smaller.
        if payload.len() > MAX_DATAGRAM_BYTES {
            return Err(TransportError::MessageTooLarge {
                size: payload.len(),
                max: MAX_DATAGRAM_BYTES,
            });
        }
        let peer = self.peer.take().ok_or(TransportError::NoPeer)?;
        self.socket.send_to(&payload, peer).await?;
        debug!(%peer, bytes = payload.len(), "Sent reply datagram");
        Ok(())
    }

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }
}

/// Controller side: a socket connected to one agent
pub struct UdpClientTransport {
    socket: UdpSocket,
    buffer: Vec<u8>,
}

impl UdpClientTransport {
    pub async fn connect(agent: SocketAddr) -> Result<Self, TransportError> {
        let local: SocketAddr = if agent.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| TransportError::Bind { address: local, source })?;
        socket
            .connect(agent)
            .await
            .map_err(|source| TransportError::Connect { address: agent, source })?;

        Ok(Self {
            socket,
            buffer: vec![0; MAX_DATAGRAM_BYTES],
        })
    }
}

#[async_trait]
impl TransportAdapter for UdpClientTransport {
    async fn receive(&mut self) -> Result<Bytes, TransportError> {
        let len = self.socket.recv(&mut self.buffer).await?;
        Ok(Bytes::copy_from_slice(&self.buffer[..len]))
    }

    async fn send(&mut self, payload: Bytes) -> Result<(), TransportError> {
        self.socket.send(&payload).await?;
        Ok(())
    }

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reply_goes_to_sender() {
        let mut server = UdpServerTransport::bind("127.0.0.1:0".parse().unwrap(), 1024).await.unwrap();
        let mut client = UdpClientTransport::connect(server.local_addr().unwrap()).await.unwrap();

        client.send(Bytes::from_static(b"ping")).await.unwrap();
        assert_eq!(server.receive().await.unwrap(), Bytes::from_static(b"ping"));

        server.send(Bytes::from_static(b"pong")).await.unwrap();
        assert_eq!(client.receive().await.unwrap(), Bytes::from_static(b"pong"));
    }

    #[tokio::test]
    async fn test_oversized_reply_keeps_peer() {
        let mut server = UdpServerTransport::bind("127.0.0.1:0".parse().unwrap(), 1024).await.unwrap();
        let mut client = UdpClientTransport::connect(server.local_addr().unwrap()).await.unwrap();

        client.send(Bytes::from_static(b"goal")).await.unwrap();
        server.receive().await.unwrap();

        let err = server.send(Bytes::from(vec![0u8; MAX_DATAGRAM_BYTES + 1])).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::MessageTooLarge { size, max } if size == MAX_DATAGRAM_BYTES + 1 && max == MAX_DATAGRAM_BYTES
        ));

        server.send(Bytes::from_static(b"notice")).await.unwrap();
        assert_eq!(client.receive().await.unwrap(), Bytes::from_static(b"notice"));
    }

    #[tokio::test]
    async fn test_send_without_request_fails() {
        let mut server = UdpServerTransport::bind("127.0.0.1:0".parse().unwrap(), 1024).await.unwrap();
        let err = server.send(Bytes::from_static(b"orphan")).await.unwrap_err();
        assert!(matches!(err, TransportError::NoPeer));
    }
}
