// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Dispatch Registry - Object Type to Handler Resolution
//
// Built once at startup and shared read-only (behind an Arc) by every
// communication manager. Lookups take no locks.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::goal_state::ObjectType;
use crate::domain::handler::{DispatchError, HandlerRef};

/// Read-only map from object-type tag to handler
#[derive(Clone, Default)]
pub struct DispatchRegistry {
    handlers: HashMap<ObjectType, HandlerRef>,
}

impl DispatchRegistry {
    pub fn builder() -> DispatchRegistryBuilder {
        DispatchRegistryBuilder::default()
    }

    /// Resolve the handler for one entry's object type
    pub fn lookup(&self, object_type: ObjectType) -> Result<HandlerRef, DispatchError> {
        self.handlers
            .get(&object_type)
            .cloned()
            .ok_or(DispatchError::NotFound(object_type))
    }

    pub fn contains(&self, object_type: ObjectType) -> bool {
        self.handlers.contains_key(&object_type)
    }

    pub fn registered_types(&self) -> Vec<ObjectType> {
        let mut types: Vec<ObjectType> = self.handlers.keys().copied().collect();
        types.sort_by_key(|t| t.to_string());
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[derive(Default)]
pub struct DispatchRegistryBuilder {
    handlers: HashMap<ObjectType, HandlerRef>,
}

impl DispatchRegistryBuilder {
    /// Register a handler under the tag it reports; a later registration for
    /// the same tag replaces the earlier one.
    pub fn register(mut self, handler: HandlerRef) -> Self {
        let object_type = handler.object_type();
        if self.handlers.insert(object_type, handler).is_some() {
            warn!(%object_type, "Replacing previously registered handler");
        } else {
            info!(%object_type, "Registered object handler");
        }
        self
    }

    pub fn build(self) -> Arc<DispatchRegistry> {
        Arc::new(DispatchRegistry {
            handlers: self.handlers,
        })
    }
}
