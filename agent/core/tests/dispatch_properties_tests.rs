// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use aca_core::application::handler_factory::create_dispatch_registry_with;
use aca_core::application::{CommunicationManager, ManagerPhase};
use aca_core::domain::agent_config::{ExecutionConfig, ExecutionMode};
use aca_core::domain::goal_state::{
    AgentReply, GoalState, GoalStateResponse, ObjectState, OperationOutcome, OperationType,
    OutcomeStatus, VirtualNetworkConfiguration,
};
use aca_core::domain::virtual_network::{BackendError, VirtualNetworkBackend, VirtualNetworkRecord};
use aca_core::infrastructure::backends::InMemoryVirtualNetworkBackend;
use aca_core::infrastructure::wire::{self, pb};
use async_trait::async_trait;
use prost::Message;
use std::sync::Arc;
use std::time::Duration;

const MAX_PAYLOAD: usize = 65_507;
const PROJECT: &str = "dbf72700-5106-4a7a-918f-a016853911f8";
const VPC_ID: &str = "99d9d709-8478-4b46-9f3f-2206b1023fd3";

fn vpc(id: &str, cidr: &str) -> VirtualNetworkConfiguration {
    VirtualNetworkConfiguration {
        project_id: PROJECT.to_string(),
        id: id.to_string(),
        name: "SuperVpc".to_string(),
        cidr: cidr.to_string(),
    }
}

fn execute_manager() -> (CommunicationManager, InMemoryVirtualNetworkBackend) {
    let backend = InMemoryVirtualNetworkBackend::new();
    let config = ExecutionConfig {
        mode: ExecutionMode::Execute,
        ..ExecutionConfig::default()
    };
    let registry = create_dispatch_registry_with(&config, Arc::new(backend.clone()));
    (CommunicationManager::new(registry, MAX_PAYLOAD), backend)
}

async fn send(manager: &CommunicationManager, goal_state: &GoalState) -> GoalStateResponse {
    let reply = manager.process(&wire::serialize_goal_state(goal_state)).await;
    match wire::deserialize_reply(&reply).unwrap() {
        AgentReply::Response(response) => response,
        AgentReply::Rejected { cause } => panic!("goal state rejected: {}", cause),
    }
}

#[tokio::test]
async fn test_create_vpc_then_resend() {
    let (manager, backend) = execute_manager();
    let goal_state = GoalState::new(
        1,
        vec![ObjectState::virtual_network(OperationType::Create, vpc(VPC_ID, "192.168.0.0/24"))],
    );

    let first = send(&manager, &goal_state).await;
    assert_eq!(first.outcomes, vec![OperationOutcome::success(VPC_ID)]);
    let stored = backend.get(VPC_ID).unwrap();

    let second = send(&manager, &goal_state).await;
    assert_eq!(second.outcomes, vec![OperationOutcome::success(VPC_ID)]);
    assert_eq!(backend.get(VPC_ID).unwrap(), stored);
    assert_eq!(backend.provision_count(), 1);
    assert_eq!(backend.reconfigure_count(), 0);
}

#[tokio::test]
async fn test_invalid_prefix_length_fails() {
    let (manager, backend) = execute_manager();
    let goal_state = GoalState::new(
        1,
        vec![ObjectState::virtual_network(OperationType::Create, vpc(VPC_ID, "192.168.0.0/99"))],
    );

    let response = send(&manager, &goal_state).await;
    assert_eq!(response.outcomes.len(), 1);
    assert_eq!(response.outcomes[0].object_id(), VPC_ID);
    assert_eq!(response.outcomes[0].status(), OutcomeStatus::Failure);
    assert_eq!(response.outcomes[0].error_detail(), Some("invalid CIDR"));
    assert!(backend.is_empty());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (manager, backend) = execute_manager();
    send(
        &manager,
        &GoalState::new(1, vec![ObjectState::virtual_network(OperationType::Create, vpc("v1", "10.0.0.0/16"))]),
    )
    .await;

    let delete = GoalState::new(2, vec![ObjectState::virtual_network(OperationType::Delete, vpc("v1", ""))]);
    assert!(send(&manager, &delete).await.outcomes[0].is_success());
    assert!(send(&manager, &delete).await.outcomes[0].is_success());
    assert!(backend.is_empty());
}

#[tokio::test]
async fn test_update_creates_missing_network() {
    let (manager, backend) = execute_manager();
    let goal_state = GoalState::new(
        1,
        vec![ObjectState::virtual_network(OperationType::Update, vpc("v7", "fd00:7::/48"))],
    );

    assert!(send(&manager, &goal_state).await.outcomes[0].is_success());
    assert_eq!(backend.get("v7").unwrap().cidr.to_string(), "fd00:7::/48");
}

#[tokio::test]
async fn test_one_bad_entry_among_many() {
    let (manager, backend) = execute_manager();
    let goal_state = GoalState::new(
        9,
        vec![
            ObjectState::virtual_network(OperationType::Create, vpc("a", "10.1.0.0/16")),
            ObjectState::virtual_network(OperationType::Create, vpc("b", "10.2.0.0/16")),
            ObjectState::virtual_network(OperationType::Create, vpc("c", "not-a-cidr")),
            ObjectState::virtual_network(OperationType::Create, vpc("d", "10.4.0.0/16")),
            ObjectState::virtual_network(OperationType::Create, vpc("e", "10.5.0.0/16")),
        ],
    );

    let response = send(&manager, &goal_state).await;
    let ids: Vec<&str> = response.outcomes.iter().map(|o| o.object_id()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);

    let failed: Vec<usize> = response
        .outcomes
        .iter()
        .enumerate()
        .filter(|(_, o)| !o.is_success())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(failed, vec![2]);
    assert_eq!(backend.len(), 4);
}

#[tokio::test]
async fn test_empty_batch_yields_empty_response() {
    let (manager, _) = execute_manager();
    let response = send(&manager, &GoalState::new(4, vec![])).await;
    assert_eq!(response.revision, 4);
    assert!(response.outcomes.is_empty());
}

#[tokio::test]
async fn test_malformed_payload_gets_transport_failure() {
    let (manager, backend) = execute_manager();
    let mut bytes = wire::serialize_goal_state(&GoalState::new(
        1,
        vec![ObjectState::virtual_network(OperationType::Create, vpc("v1", "10.0.0.0/16"))],
    ))
    .to_vec();
    bytes.truncate(bytes.len() - 3);

    let reply = wire::deserialize_reply(&manager.process(&bytes).await).unwrap();
    assert!(matches!(reply, AgentReply::Rejected { .. }));
    assert!(backend.is_empty());
    assert_eq!(manager.phase(), ManagerPhase::Idle);
}

// A newer controller schema with an object type this agent does not know.
#[derive(Clone, PartialEq, Message)]
struct FutureSubnet {
    #[prost(string, tag = "1")]
    id: String,
}

#[derive(Clone, PartialEq, Message)]
struct FutureObjectState {
    #[prost(int32, optional, tag = "1")]
    operation_type: Option<i32>,
    #[prost(message, optional, tag = "2")]
    vpc: Option<pb::VpcConfiguration>,
    #[prost(message, optional, tag = "15")]
    subnet: Option<FutureSubnet>,
}

#[derive(Clone, PartialEq, Message)]
struct FutureGoalState {
    #[prost(uint32, tag = "1")]
    format_version: u32,
    #[prost(uint64, tag = "2")]
    revision: u64,
    #[prost(message, repeated, tag = "3")]
    object_states: Vec<FutureObjectState>,
}

#[tokio::test]
async fn test_unknown_object_type_fails_alone() {
    let (manager, backend) = execute_manager();
    let create = Some(pb::OperationType::Create as i32);
    let message = FutureGoalState {
        format_version: 1,
        revision: 3,
        object_states: vec![
            FutureObjectState {
                operation_type: create,
                vpc: Some(pb::VpcConfiguration {
                    project_id: PROJECT.to_string(),
                    id: "v1".to_string(),
                    name: "SuperVpc".to_string(),
                    cidr: "10.0.0.0/16".to_string(),
                }),
                subnet: None,
            },
            FutureObjectState {
                operation_type: create,
                vpc: None,
                subnet: Some(FutureSubnet { id: "s1".to_string() }),
            },
        ],
    };

    let reply = wire::deserialize_reply(&manager.process(&message.encode_to_vec()).await).unwrap();
    let AgentReply::Response(response) = reply else {
        panic!("expected a goal state response");
    };

    assert_eq!(response.outcomes.len(), 2);
    assert!(response.outcomes[0].is_success());
    assert_eq!(response.outcomes[1].error_detail(), Some("unsupported object type"));
    assert_eq!(backend.len(), 1);
}

#[tokio::test]
async fn test_unsupported_operation_on_known_type_fails_alone() {
    let (manager, backend) = execute_manager();
    let entry = |operation_type: i32, id: &str| FutureObjectState {
        operation_type: Some(operation_type),
        vpc: Some(pb::VpcConfiguration {
            project_id: PROJECT.to_string(),
            id: id.to_string(),
            name: "SuperVpc".to_string(),
            cidr: "10.0.0.0/16".to_string(),
        }),
        subnet: None,
    };
    let message = FutureGoalState {
        format_version: 1,
        revision: 4,
        object_states: vec![entry(42, "v1"), entry(pb::OperationType::Create as i32, "v2")],
    };

    let reply = wire::deserialize_reply(&manager.process(&message.encode_to_vec()).await).unwrap();
    let AgentReply::Response(response) = reply else {
        panic!("expected a goal state response");
    };

    assert_eq!(response.revision, 4);
    assert_eq!(
        response.outcomes,
        vec![
            OperationOutcome::failure("v1", "unsupported operation type"),
            OperationOutcome::success("v2"),
        ]
    );
    assert!(backend.get("v1").is_none());
    assert!(backend.get("v2").is_some());
    assert_eq!(backend.len(), 1);
}

struct SlowBackend {
    delay: Duration,
}

#[async_trait]
impl VirtualNetworkBackend for SlowBackend {
    async fn find(&self, _id: &str) -> Result<Option<VirtualNetworkRecord>, BackendError> {
        Ok(None)
    }

    async fn provision(&self, _record: &VirtualNetworkRecord) -> Result<(), BackendError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn reconfigure(&self, _record: &VirtualNetworkRecord) -> Result<(), BackendError> {
        Ok(())
    }

    async fn remove(&self, _id: &str) -> Result<bool, BackendError> {
        Err(BackendError::Unavailable("switch agent not running".to_string()))
    }
}

#[tokio::test]
async fn test_slow_backend_times_out_per_entry() {
    let config = ExecutionConfig {
        mode: ExecutionMode::Execute,
        backend_timeout_ms: 20,
    };
    let backend = Arc::new(SlowBackend {
        delay: Duration::from_secs(5),
    });
    let manager = CommunicationManager::new(create_dispatch_registry_with(&config, backend), MAX_PAYLOAD);

    let goal_state = GoalState::new(
        1,
        vec![
            ObjectState::virtual_network(OperationType::Create, vpc("v1", "10.0.0.0/16")),
            ObjectState::virtual_network(OperationType::Delete, vpc("v2", "10.0.0.0/16")),
        ],
    );

    let response = manager.apply(&goal_state).await;
    assert_eq!(response.outcomes[0].error_detail(), Some("operation timed out"));
    assert_eq!(
        response.outcomes[1].error_detail(),
        Some("apply failed: backend unavailable: switch agent not running")
    );
}

#[tokio::test]
async fn test_concurrent_requests_are_serialized() {
    let (manager, backend) = execute_manager();
    let manager = Arc::new(manager);

    let mut tasks = Vec::new();
    for revision in 0..8u64 {
        let manager = manager.clone();
        tasks.push(tokio::spawn(async move {
            let goal_state = GoalState::new(
                revision,
                vec![ObjectState::virtual_network(OperationType::Create, vpc("shared", "10.9.0.0/16"))],
            );
            manager.apply(&goal_state).await
        }));
    }

    for task in tasks {
        assert!(task.await.unwrap().outcomes[0].is_success());
    }
    assert_eq!(backend.provision_count(), 1);
}
