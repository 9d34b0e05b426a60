// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `aca run`: serve goal states until SIGINT or SIGTERM.

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use aca_core::application::handler_factory::create_dispatch_registry;
use aca_core::application::CommunicationManager;
use aca_core::domain::agent_config::{AgentConfigManifest, ExecutionMode};
use aca_core::infrastructure::transport;
use aca_core::presentation::AgentServer;

/// Signal that ended the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Interrupt,
    Terminate,
}

impl Shutdown {
    /// Conventional shell exit status for a process stopped by this signal
    pub fn exit_code(self) -> i32 {
        match self {
            Shutdown::Interrupt => 130,
            Shutdown::Terminate => 143,
        }
    }
}

pub async fn execute(config: AgentConfigManifest) -> Result<Shutdown> {
    let transport_config = &config.spec.transport;
    let execution = &config.spec.execution;

    if execution.mode == ExecutionMode::DryRun {
        warn!("Running in dry-run mode; pass -e to apply goal states to the host");
    }

    let registry = create_dispatch_registry(execution);
    let manager = Arc::new(CommunicationManager::new(registry, transport_config.max_payload_bytes));

    let transport = transport::bind_server(transport_config)
        .await
        .with_context(|| {
            format!(
                "Failed to bind {} transport on {}:{}",
                transport_config.protocol, transport_config.server_address, transport_config.port
            )
        })?;

    info!(
        agent = %config.metadata.name,
        protocol = %transport_config.protocol,
        mode = ?execution.mode,
        "ACA agent started"
    );

    let server = AgentServer::new(manager, transport);
    supervise(server, shutdown_signal()).await
}

/// Run `server` until `shutdown` resolves or the server stops on its own.
///
/// The server only returns by itself on a fatal error, so an early exit is
/// reported as a failure instead of waiting for a signal that may never come.
async fn supervise<F>(server: AgentServer, shutdown: F) -> Result<Shutdown>
where
    F: Future<Output = Result<Shutdown>>,
{
    let shutdown_token = server.shutdown_token();
    let mut server_task = tokio::spawn(server.run());

    let reason = tokio::select! {
        reason = shutdown => reason?,
        finished = &mut server_task => {
            let served = finished
                .context("Agent server task panicked")?
                .context("Agent server failed")?;
            anyhow::bail!("Agent server stopped unexpectedly after {} replies", served);
        }
    };

    info!(signal = ?reason, "Shutting down agent");
    shutdown_token.cancel();

    let served = server_task
        .await
        .context("Agent server task panicked")?
        .context("Agent server failed")?;
    info!(served, "Agent stopped");

    Ok(reason)
}

async fn shutdown_signal() -> Result<Shutdown> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result.context("Failed to install Ctrl+C handler")?;
                Ok(Shutdown::Interrupt)
            }
            _ = terminate.recv() => Ok(Shutdown::Terminate),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.context("Failed to install Ctrl+C handler")?;
        Ok(Shutdown::Interrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aca_core::domain::agent_config::ExecutionConfig;
    use aca_core::infrastructure::transport::{TransportAdapter, TransportError, UdpServerTransport};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::net::SocketAddr;
    use std::time::Duration;

    /// Transport whose socket has already gone away
    struct UnboundTransport;

    #[async_trait]
    impl TransportAdapter for UnboundTransport {
        async fn receive(&mut self) -> Result<Bytes, TransportError> {
            Err(TransportError::ConnectionClosed)
        }

        async fn send(&mut self, _payload: Bytes) -> Result<(), TransportError> {
            Err(TransportError::NoPeer)
        }

        fn local_addr(&self) -> Result<SocketAddr, TransportError> {
            Err(TransportError::Io(std::io::Error::other("socket closed")))
        }
    }

    fn manager() -> Arc<CommunicationManager> {
        Arc::new(CommunicationManager::new(
            create_dispatch_registry(&ExecutionConfig::default()),
            65_507,
        ))
    }

    #[tokio::test]
    async fn test_server_failure_ends_supervision() {
        let server = AgentServer::new(manager(), Box::new(UnboundTransport));
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            supervise(server, std::future::pending()),
        )
        .await
        .expect("supervision should end when the server fails");

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("Agent server failed"), "{:#}", err);
    }

    #[tokio::test]
    async fn test_signal_stops_server() {
        let transport = UdpServerTransport::bind("127.0.0.1:0".parse().unwrap(), 4096).await.unwrap();
        let server = AgentServer::new(manager(), Box::new(transport));

        let reason = supervise(server, async { Ok(Shutdown::Terminate) }).await.unwrap();
        assert_eq!(reason, Shutdown::Terminate);
        assert_eq!(reason.exit_code(), 143);
    }
}
