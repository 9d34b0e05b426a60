// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent Server
//!
//! Receive loop that feeds transport payloads into the communication manager
//! and writes each reply back, until its shutdown token is cancelled.
//!
//! Receive failures back off exponentially so a broken socket cannot spin the
//! loop. A reply too large for the transport is replaced by a
//! `TransportFailure` reply naming the size, so the controller is never left
//! waiting for a datagram that was never sent.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::comm_manager::CommunicationManager;
use crate::domain::goal_state::AgentReply;
use crate::infrastructure::transport::{TransportAdapter, TransportError};
use crate::infrastructure::wire;

const RECEIVE_BACKOFF_BASE: Duration = Duration::from_millis(10);
const RECEIVE_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Delay before the next receive after `failures` consecutive errors.
fn receive_backoff(failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(16);
    RECEIVE_BACKOFF_BASE
        .saturating_mul(1u32 << exponent)
        .min(RECEIVE_BACKOFF_MAX)
}

pub struct AgentServer {
    manager: Arc<CommunicationManager>,
    transport: Box<dyn TransportAdapter>,
    shutdown_token: CancellationToken,
}

impl AgentServer {
    pub fn new(manager: Arc<CommunicationManager>, transport: Box<dyn TransportAdapter>) -> Self {
        Self {
            manager,
            transport,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Token that stops [`AgentServer::run`] when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Serve requests until shutdown; returns the number of replies sent.
    ///
    /// A request already being dispatched runs to completion before the
    /// token is observed again.
    pub async fn run(mut self) -> Result<u64, TransportError> {
        let address = self.transport.local_addr()?;
        info!(%address, "Agent server listening for goal states");

        let mut served = 0u64;
        let mut receive_failures = 0u32;
        loop {
            let payload = tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping agent server");
                    break;
                }
                received = self.transport.receive() => match received {
                    Ok(payload) => {
                        receive_failures = 0;
                        payload
                    }
                    Err(e) => {
                        receive_failures = receive_failures.saturating_add(1);
                        let delay = receive_backoff(receive_failures);
                        error!(
                            error = %e,
                            failures = receive_failures,
                            retry_in_ms = delay.as_millis() as u64,
                            "Failed to receive goal state"
                        );
                        tokio::select! {
                            _ = self.shutdown_token.cancelled() => {}
                            _ = tokio::time::sleep(delay) => {}
                        }
                        continue;
                    }
                },
            };

            let reply = self.manager.process(&payload).await;
            match self.reply(reply).await {
                Ok(()) => {
                    served += 1;
                    debug!(served, "Reply sent");
                }
                Err(e) => warn!(error = %e, "Failed to send reply"),
            }
        }

        info!(served, "Agent server stopped");
        Ok(served)
    }

    async fn reply(&mut self, reply: Bytes) -> Result<(), TransportError> {
        match self.transport.send(reply).await {
            Err(TransportError::MessageTooLarge { size, max }) => {
                warn!(size, max, "Reply exceeds transport limit, sending failure notice instead");
                let notice = AgentReply::Rejected {
                    cause: format!("reply of {} bytes exceeds the {} byte transport limit", size, max),
                };
                self.transport.send(wire::serialize_reply(&notice)).await
            }
            other => other,
        }
    }
}
