// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! TCP transport with length-delimited frames.
//!
//! The server holds at most one connection at a time and serves its frames in
//! order; the next connection is accepted once the current peer hangs up or
//! breaks framing.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, info, warn};

use super::{TransportAdapter, TransportError};

fn codec(max_frame_length: usize) -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(max_frame_length)
        .new_codec()
}

pub struct TcpServerTransport {
    listener: TcpListener,
    connection: Option<Framed<TcpStream, LengthDelimitedCodec>>,
    max_frame_length: usize,
}

impl TcpServerTransport {
    pub async fn bind(address: SocketAddr, max_payload_bytes: usize) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| TransportError::Bind { address, source })?;

        Ok(Self {
            listener,
            connection: None,
            max_frame_length: max_payload_bytes,
        })
    }
}

#[async_trait]
impl TransportAdapter for TcpServerTransport {
    async fn receive(&mut self) -> Result<Bytes, TransportError> {
        loop {
            if self.connection.is_none() {
                let (stream, peer) = self.listener.accept().await?;
                info!(%peer, "Accepted controller connection");
                self.connection = Some(Framed::new(stream, codec(self.max_frame_length)));
            }
            let Some(connection) = self.connection.as_mut() else {
                continue;
            };

            match connection.next().await {
                Some(Ok(frame)) => {
                    debug!(bytes = frame.len(), "Received frame");
                    return Ok(frame.freeze());
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Dropping controller connection after framing error");
                    self.connection = None;
                }
                None => {
                    debug!("Controller closed connection");
                    self.connection = None;
                }
            }
        }
    }

    async fn send(&mut self, payload: Bytes) -> Result<(), TransportError> {
        if payload.len() > self.max_frame_length {
            return Err(TransportError::MessageTooLarge {
                size: payload.len(),
                max: self.max_frame_length,
            });
        }
        let connection = self.connection.as_mut().ok_or(TransportError::NoPeer)?;
        if let Err(e) = connection.send(payload).await {
            self.connection = None;
            return Err(e.into());
        }
        Ok(())
    }

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }
}

pub struct TcpClientTransport {
    framed: Framed<TcpStream, LengthDelimitedCodec>,
}

impl TcpClientTransport {
    pub async fn connect(agent: SocketAddr, max_payload_bytes: usize) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(agent)
            .await
            .map_err(|source| TransportError::Connect { address: agent, source })?;

        Ok(Self {
            framed: Framed::new(stream, codec(max_payload_bytes)),
        })
    }
}

#[async_trait]
impl TransportAdapter for TcpClientTransport {
    async fn receive(&mut self) -> Result<Bytes, TransportError> {
        match self.framed.next().await {
            Some(frame) => Ok(frame?.freeze()),
            None => Err(TransportError::ConnectionClosed),
        }
    }

    async fn send(&mut self, payload: Bytes) -> Result<(), TransportError> {
        self.framed.send(payload).await?;
        Ok(())
    }

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.framed.get_ref().local_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_roundtrip_over_loopback() {
        let mut server = TcpServerTransport::bind("127.0.0.1:0".parse().unwrap(), 1024).await.unwrap();
        let address = server.local_addr().unwrap();

        let client_task = tokio::spawn(async move {
            let mut client = TcpClientTransport::connect(address, 1024).await.unwrap();
            client.send(Bytes::from_static(b"goal")).await.unwrap();
            client.receive().await.unwrap()
        });

        assert_eq!(server.receive().await.unwrap(), Bytes::from_static(b"goal"));
        server.send(Bytes::from_static(b"reply")).await.unwrap();

        assert_eq!(client_task.await.unwrap(), Bytes::from_static(b"reply"));
    }

    #[tokio::test]
    async fn test_oversized_reply_keeps_connection() {
        let mut server = TcpServerTransport::bind("127.0.0.1:0".parse().unwrap(), 16).await.unwrap();
        let address = server.local_addr().unwrap();

        let client_task = tokio::spawn(async move {
            let mut client = TcpClientTransport::connect(address, 16).await.unwrap();
            client.send(Bytes::from_static(b"goal")).await.unwrap();
            client.receive().await.unwrap()
        });

        server.receive().await.unwrap();
        let err = server.send(Bytes::from(vec![0u8; 17])).await.unwrap_err();
        assert!(matches!(err, TransportError::MessageTooLarge { size: 17, max: 16 }));

        server.send(Bytes::from_static(b"short")).await.unwrap();
        assert_eq!(client_task.await.unwrap(), Bytes::from_static(b"short"));
    }

    #[tokio::test]
    async fn test_server_moves_on_to_next_connection() {
        let mut server = TcpServerTransport::bind("127.0.0.1:0".parse().unwrap(), 1024).await.unwrap();
        let address = server.local_addr().unwrap();

        let clients = tokio::spawn(async move {
            {
                let mut first = TcpClientTransport::connect(address, 1024).await.unwrap();
                first.send(Bytes::from_static(b"one")).await.unwrap();
                first.receive().await.unwrap();
            }
            let mut second = TcpClientTransport::connect(address, 1024).await.unwrap();
            second.send(Bytes::from_static(b"two")).await.unwrap();
            second.receive().await.unwrap()
        });

        assert_eq!(server.receive().await.unwrap(), Bytes::from_static(b"one"));
        server.send(Bytes::from_static(b"ack-one")).await.unwrap();
        assert_eq!(server.receive().await.unwrap(), Bytes::from_static(b"two"));
        server.send(Bytes::from_static(b"ack-two")).await.unwrap();

        assert_eq!(clients.await.unwrap(), Bytes::from_static(b"ack-two"));
    }
}
