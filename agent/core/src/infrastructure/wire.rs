// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Goal state wire codec
//!
//! Translates between the protobuf schema in `proto/goalstate.proto` and the
//! domain model in [`crate::domain::goal_state`].
//!
//! - Decoding is all-or-nothing: a payload either yields a complete
//!   [`GoalState`] or a [`DeserializationError`]. Unknown configuration tags are
//!   not errors; each becomes one [`ObjectConfiguration::Unrecognized`] entry.
//! - Encoding a reply is total.
//!
//! Buffers are owned `Vec<u8>`/[`Bytes`] values and are released on every
//! exit path.

use bytes::Bytes;
use prost::Message;
use thiserror::Error;

use crate::domain::goal_state::{
    AgentReply, GoalState, GoalStateResponse, ObjectConfiguration, ObjectState, OperationOutcome,
    OperationType, OperationTypeError, OutcomeStatus, VirtualNetworkConfiguration,
    SUPPORTED_FORMAT_VERSION,
};

// Generated protobuf code
pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/aca.goalstate.v1.rs"));
}

/// Whole-request decode failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeserializationError {
    #[error("empty payload")]
    Empty,

    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("malformed goal state: {0}")]
    Malformed(String),

    #[error("unsupported goal state format version {0}")]
    UnsupportedFormat(u32),
}

impl From<prost::DecodeError> for DeserializationError {
    fn from(err: prost::DecodeError) -> Self {
        DeserializationError::Malformed(err.to_string())
    }
}

/// Decode an inbound goal state payload.
pub fn deserialize_goal_state(payload: &[u8], max_payload_bytes: usize) -> Result<GoalState, DeserializationError> {
    if payload.is_empty() {
        return Err(DeserializationError::Empty);
    }
    if payload.len() > max_payload_bytes {
        return Err(DeserializationError::PayloadTooLarge {
            size: payload.len(),
            max: max_payload_bytes,
        });
    }

    let message = pb::GoalState::decode(payload)?;
    if message.format_version != SUPPORTED_FORMAT_VERSION {
        return Err(DeserializationError::UnsupportedFormat(message.format_version));
    }

    let entries = message.object_states.into_iter().map(object_state_from_pb).collect();

    Ok(GoalState::new(message.revision, entries))
}

/// Encode a goal state as the controller would send it.
pub fn serialize_goal_state(goal_state: &GoalState) -> Bytes {
    let message = pb::GoalState {
        format_version: SUPPORTED_FORMAT_VERSION,
        revision: goal_state.revision,
        object_states: goal_state.entries.iter().map(object_state_to_pb).collect(),
    };
    Bytes::from(message.encode_to_vec())
}

/// Encode the reply for one request.
pub fn serialize_reply(reply: &AgentReply) -> Bytes {
    let reply = match reply {
        AgentReply::Response(response) => pb::agent_reply::Reply::GoalStateResponse(response_to_pb(response)),
        AgentReply::Rejected { cause } => pb::agent_reply::Reply::TransportFailure(pb::TransportFailure {
            cause: cause.clone(),
        }),
    };
    Bytes::from(pb::AgentReply { reply: Some(reply) }.encode_to_vec())
}

/// Decode a reply received from an agent.
pub fn deserialize_reply(payload: &[u8]) -> Result<AgentReply, DeserializationError> {
    let message = pb::AgentReply::decode(payload)?;
    match message.reply {
        Some(pb::agent_reply::Reply::GoalStateResponse(response)) => Ok(AgentReply::Response(response_from_pb(response))),
        Some(pb::agent_reply::Reply::TransportFailure(failure)) => Ok(AgentReply::Rejected { cause: failure.cause }),
        None => Err(DeserializationError::Malformed("reply carries neither a response nor a failure".to_string())),
    }
}

fn object_state_from_pb(state: pb::ObjectState) -> ObjectState {
    let operation = match state.operation_type {
        None => Err(OperationTypeError::Missing),
        Some(raw) => match pb::OperationType::try_from(raw) {
            Ok(pb::OperationType::Create) => Ok(OperationType::Create),
            Ok(pb::OperationType::Update) => Ok(OperationType::Update),
            Ok(pb::OperationType::Delete) => Ok(OperationType::Delete),
            Err(_) => Err(OperationTypeError::Unsupported(raw)),
        },
    };

    let configuration = match state.configuration {
        Some(pb::object_state::Configuration::Vpc(vpc)) => {
            ObjectConfiguration::VirtualNetwork(VirtualNetworkConfiguration {
                project_id: vpc.project_id,
                id: vpc.id,
                name: vpc.name,
                cidr: vpc.cidr,
            })
        }
        None => ObjectConfiguration::Unrecognized,
    };

    ObjectState { operation, configuration }
}

fn object_state_to_pb(state: &ObjectState) -> pb::ObjectState {
    let operation_type = match &state.operation {
        Ok(OperationType::Create) => Some(pb::OperationType::Create as i32),
        Ok(OperationType::Update) => Some(pb::OperationType::Update as i32),
        Ok(OperationType::Delete) => Some(pb::OperationType::Delete as i32),
        Err(OperationTypeError::Missing) => None,
        Err(OperationTypeError::Unsupported(raw)) => Some(*raw),
    };

    let configuration = match &state.configuration {
        ObjectConfiguration::VirtualNetwork(config) => Some(pb::object_state::Configuration::Vpc(pb::VpcConfiguration {
            project_id: config.project_id.clone(),
            id: config.id.clone(),
            name: config.name.clone(),
            cidr: config.cidr.clone(),
        })),
        ObjectConfiguration::Unrecognized => None,
    };

    pb::ObjectState {
        operation_type,
        configuration,
    }
}

fn response_to_pb(response: &GoalStateResponse) -> pb::GoalStateResponse {
    pb::GoalStateResponse {
        revision: response.revision,
        outcomes: response
            .outcomes
            .iter()
            .map(|outcome| pb::OperationOutcome {
                object_id: outcome.object_id().to_string(),
                status: match outcome.status() {
                    OutcomeStatus::Success => pb::OperationStatus::Success as i32,
                    OutcomeStatus::Failure => pb::OperationStatus::Failure as i32,
                },
                error_detail: outcome.error_detail().map(str::to_string),
            })
            .collect(),
    }
}

fn response_from_pb(response: pb::GoalStateResponse) -> GoalStateResponse {
    let outcomes = response
        .outcomes
        .into_iter()
        .map(|outcome| match pb::OperationStatus::try_from(outcome.status) {
            Ok(pb::OperationStatus::Success) => OperationOutcome::success(outcome.object_id),
            _ => OperationOutcome::failure(
                outcome.object_id,
                outcome.error_detail.unwrap_or_else(|| "unspecified failure".to_string()),
            ),
        })
        .collect();

    GoalStateResponse {
        revision: response.revision,
        outcomes,
    }
}
