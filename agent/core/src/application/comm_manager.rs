// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Communication Manager
//!
//! Turns one inbound goal-state payload into one reply payload:
//!
//! ```text
//! Idle -> Deserializing -> Dispatching -> Aggregating -> Responding -> Idle
//!              |
//!              +-- malformed payload --> Responding (transport failure reply)
//! ```
//!
//! Every entry is evaluated even when earlier ones fail, and outcomes keep the
//! order of the request entries. A manager processes one request at a time;
//! concurrent callers queue on an internal async mutex.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Request/response contract between transport and handlers

use bytes::Bytes;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::registry::DispatchRegistry;
use crate::domain::goal_state::{
    AgentReply, GoalState, GoalStateResponse, ObjectState, OperationOutcome, OperationType,
};
use crate::infrastructure::wire;

/// Where the manager currently is in its request cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerPhase {
    Idle,
    Deserializing,
    Dispatching,
    Aggregating,
    Responding,
}

impl fmt::Display for ManagerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ManagerPhase::Idle => "idle",
            ManagerPhase::Deserializing => "deserializing",
            ManagerPhase::Dispatching => "dispatching",
            ManagerPhase::Aggregating => "aggregating",
            ManagerPhase::Responding => "responding",
        };
        f.write_str(name)
    }
}

pub struct CommunicationManager {
    registry: Arc<DispatchRegistry>,
    max_payload_bytes: usize,
    phase: Mutex<ManagerPhase>,
    in_flight: tokio::sync::Mutex<()>,
}

impl CommunicationManager {
    pub fn new(registry: Arc<DispatchRegistry>, max_payload_bytes: usize) -> Self {
        Self {
            registry,
            max_payload_bytes,
            phase: Mutex::new(ManagerPhase::Idle),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    pub fn phase(&self) -> ManagerPhase {
        *self.phase.lock()
    }

    /// Process one raw request and return the encoded reply.
    pub async fn process(&self, payload: &[u8]) -> Bytes {
        let _in_flight = self.in_flight.lock().await;

        let reply = self.handle_exclusive(payload).await;
        self.transition(ManagerPhase::Responding);
        let encoded = wire::serialize_reply(&reply);
        self.transition(ManagerPhase::Idle);
        encoded
    }

    /// Process one raw request and return the reply before encoding.
    pub async fn handle(&self, payload: &[u8]) -> AgentReply {
        let _in_flight = self.in_flight.lock().await;

        let reply = self.handle_exclusive(payload).await;
        self.transition(ManagerPhase::Idle);
        reply
    }

    /// Apply an already decoded goal state.
    pub async fn apply(&self, goal_state: &GoalState) -> GoalStateResponse {
        let _in_flight = self.in_flight.lock().await;

        let response = self.dispatch_all(goal_state).await;
        self.transition(ManagerPhase::Idle);
        response
    }

    async fn handle_exclusive(&self, payload: &[u8]) -> AgentReply {
        self.transition(ManagerPhase::Deserializing);
        match wire::deserialize_goal_state(payload, self.max_payload_bytes) {
            Ok(goal_state) => AgentReply::Response(self.dispatch_all(&goal_state).await),
            Err(err) => {
                warn!(bytes = payload.len(), error = %err, "Rejected goal state payload");
                AgentReply::Rejected { cause: err.to_string() }
            }
        }
    }

    async fn dispatch_all(&self, goal_state: &GoalState) -> GoalStateResponse {
        self.transition(ManagerPhase::Dispatching);
        let mut outcomes = Vec::with_capacity(goal_state.len());
        for entry in &goal_state.entries {
            outcomes.push(self.dispatch(entry).await);
        }

        self.transition(ManagerPhase::Aggregating);
        let response = GoalStateResponse {
            revision: goal_state.revision,
            outcomes,
        };

        info!(
            revision = response.revision,
            entries = goal_state.len(),
            succeeded = response.success_count(),
            failed = response.failure_count(),
            "Processed goal state"
        );
        response
    }

    async fn dispatch(&self, entry: &ObjectState) -> OperationOutcome {
        let object_id = entry.object_id();

        let handler = match self.registry.lookup(entry.configuration.object_type()) {
            Ok(handler) => handler,
            Err(err) => {
                debug!(object_id, error = %err, "No handler for entry");
                return OperationOutcome::failure(object_id, err.to_string());
            }
        };

        let operation = match &entry.operation {
            Ok(operation) => *operation,
            Err(err) => {
                debug!(object_id, error = %err, "Entry has no usable operation");
                return OperationOutcome::failure(object_id, err.to_string());
            }
        };

        debug!(object_id, %operation, object_type = %handler.object_type(), "Dispatching entry");
        match operation {
            OperationType::Create => handler.apply_create(&entry.configuration).await,
            OperationType::Update => handler.apply_update(&entry.configuration).await,
            OperationType::Delete => handler.apply_delete(object_id).await,
        }
    }

    fn transition(&self, next: ManagerPhase) {
        let mut phase = self.phase.lock();
        let previous = *phase;
        if previous != next {
            debug!(from = %previous, to = %next, "Manager phase transition");
            *phase = next;
        }
    }
}
