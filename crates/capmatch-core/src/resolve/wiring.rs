//! Wiring results recorded by the external resolution algorithm.

use std::sync::Arc;

use crate::model::{Capability, Requirement, ResourceId};

/// One satisfied requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wire {
    pub requirement: Requirement,
    pub capability: Arc<Capability>,
    pub provider: ResourceId,
}

impl Wire {
    pub fn new(requirement: Requirement, capability: Arc<Capability>) -> Self {
        let provider = capability.owner().clone();
        Self {
            requirement,
            capability,
            provider,
        }
    }
}

/// The wires of one resolved resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wiring {
    pub resource: ResourceId,
    pub required: Vec<Wire>,
}

impl Wiring {
    pub fn new(resource: ResourceId) -> Self {
        Self {
            resource,
            required: Vec::new(),
        }
    }

    pub fn with_wire(mut self, wire: Wire) -> Self {
        self.required.push(wire);
        self
    }

    /// Resources this wiring depends on, in wire order without repeats.
    pub fn providers(&self) -> Vec<&ResourceId> {
        let mut providers: Vec<&ResourceId> = Vec::new();
        for wire in &self.required {
            if !providers.contains(&&wire.provider) {
                providers.push(&wire.provider);
            }
        }
        providers
    }
}
