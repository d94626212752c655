//! Immutable description of the agents sharing an environment.
//!
//! The descriptor is built once per planning agent and handed to the planner and
//! every collaborator by reference. It fixes the frames (agent types), the
//! actions each frame can take, which neighbors exist, and which shared
//! resources each neighbor can act on. FAC capacities are derived from it.

use std::collections::HashSet;

use crate::{
    error::DescriptorError,
    fac::{CapacityEntry, FacLayout},
    tree::ids::ActionId,
};

/// Index of an agent type (frame).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(usize);

impl FrameId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for FrameId {
    fn from(value: usize) -> Self {
        FrameId(value)
    }
}

/// Index of a neighbor agent in the descriptor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NeighborId(usize);

impl NeighborId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for NeighborId {
    fn from(value: usize) -> Self {
        NeighborId(value)
    }
}

/// Index of a shared resource (for example one fire).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(usize);

impl ResourceId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for ResourceId {
    fn from(value: usize) -> Self {
        ResourceId(value)
    }
}

/// An agent type and the full set of action names its members may use.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSpec {
    pub name: String,
    pub actions: Vec<String>,
}

/// One neighbor: its frame, the actions it can actually take, and the
/// resources it can act on.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborSpec {
    pub frame: FrameId,
    pub actions: Vec<String>,
    pub resources: Vec<ResourceId>,
}

/// The planning agent itself.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    pub frame: FrameId,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EnvironmentDescriptor {
    frames: Vec<FrameSpec>,
    neighbors: Vec<NeighborSpec>,
    agent: AgentSpec,
    resource_count: usize,
    noop: String,
}

impl EnvironmentDescriptor {
    /// Build and validate a descriptor.
    ///
    /// Every frame must declare the `noop` action, and the agent and every
    /// neighbor may only reference actions of their own frame.
    pub fn new(
        frames: Vec<FrameSpec>,
        neighbors: Vec<NeighborSpec>,
        agent: AgentSpec,
        resource_count: usize,
        noop: impl Into<String>,
    ) -> Result<Self, DescriptorError> {
        let descriptor = EnvironmentDescriptor {
            frames,
            neighbors,
            agent,
            resource_count,
            noop: noop.into(),
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    fn validate(&self) -> Result<(), DescriptorError> {
        if self.frames.is_empty() {
            return Err(DescriptorError::NoFrames);
        }

        for frame in &self.frames {
            let mut seen = HashSet::with_capacity(frame.actions.len());
            for action in &frame.actions {
                if !seen.insert(action.as_str()) {
                    return Err(DescriptorError::DuplicateAction {
                        frame: frame.name.clone(),
                        action: action.clone(),
                    });
                }
            }
            if !seen.contains(self.noop.as_str()) {
                return Err(DescriptorError::MissingNoop {
                    frame: frame.name.clone(),
                    noop: self.noop.clone(),
                });
            }
        }

        let agent_frame = self.frame_checked(self.agent.frame)?;
        if self.agent.actions.is_empty() {
            return Err(DescriptorError::NoAgentActions);
        }
        for action in &self.agent.actions {
            if !agent_frame.actions.contains(action) {
                return Err(DescriptorError::UnknownAction {
                    frame: agent_frame.name.clone(),
                    action: action.clone(),
                });
            }
        }

        for (idx, neighbor) in self.neighbors.iter().enumerate() {
            let frame = self.frame_checked(neighbor.frame)?;
            if !neighbor.actions.contains(&self.noop) {
                return Err(DescriptorError::NeighborWithoutNoop { neighbor: idx });
            }
            for action in &neighbor.actions {
                if !frame.actions.contains(action) {
                    return Err(DescriptorError::UnknownAction {
                        frame: frame.name.clone(),
                        action: action.clone(),
                    });
                }
            }
            for resource in &neighbor.resources {
                if resource.index() >= self.resource_count {
                    return Err(DescriptorError::UnknownResource {
                        neighbor: idx,
                        resource: resource.index(),
                    });
                }
            }
        }

        Ok(())
    }

    fn frame_checked(&self, frame: FrameId) -> Result<&FrameSpec, DescriptorError> {
        self.frames
            .get(frame.index())
            .ok_or(DescriptorError::UnknownFrame {
                frame: frame.index(),
            })
    }

    pub fn frames(&self) -> &[FrameSpec] {
        &self.frames
    }

    pub fn frame(&self, frame: FrameId) -> Option<&FrameSpec> {
        self.frames.get(frame.index())
    }

    pub fn neighbors(&self) -> &[NeighborSpec] {
        &self.neighbors
    }

    pub fn neighbor(&self, neighbor: NeighborId) -> Option<&NeighborSpec> {
        self.neighbors.get(neighbor.index())
    }

    pub fn agent(&self) -> &AgentSpec {
        &self.agent
    }

    pub fn resource_count(&self) -> usize {
        self.resource_count
    }

    /// Name of the action that does nothing.
    pub fn noop(&self) -> &str {
        &self.noop
    }

    /// Number of actions available to the planning agent.
    pub fn agent_action_count(&self) -> usize {
        self.agent.actions.len()
    }

    pub fn agent_action_name(&self, action: ActionId) -> Option<&str> {
        self.agent.actions.get(action.index()).map(String::as_str)
    }

    pub fn is_noop(&self, action: ActionId) -> bool {
        self.agent_action_name(action) == Some(self.noop.as_str())
    }

    /// Number of neighbors belonging to `frame`.
    pub fn population(&self, frame: FrameId) -> usize {
        self.neighbors.iter().filter(|n| n.frame == frame).count()
    }

    /// Neighbors grouped by the resource they can act on, indexed by resource.
    /// A neighbor acting on several resources appears in several groups.
    pub fn resource_groups(&self) -> Vec<Vec<NeighborId>> {
        let mut groups = vec![Vec::new(); self.resource_count];
        for (idx, neighbor) in self.neighbors.iter().enumerate() {
            for resource in &neighbor.resources {
                groups[resource.index()].push(NeighborId::from(idx));
            }
        }
        groups
    }

    /// FAC capacity layout over the neighbors only.
    ///
    /// The capacity of `(frame, action)` is the number of neighbors of that
    /// frame able to take the action.
    pub fn neighbor_layout(&self) -> FacLayout {
        let mut populations = Vec::with_capacity(self.frames.len());
        let mut entries = Vec::new();

        for (f, frame) in self.frames.iter().enumerate() {
            let frame_id = FrameId::from(f);
            let members: Vec<&NeighborSpec> = self
                .neighbors
                .iter()
                .filter(|n| n.frame == frame_id)
                .collect();
            populations.push(members.len() as u32);

            for action in &frame.actions {
                let max_count = members
                    .iter()
                    .filter(|n| n.actions.contains(action))
                    .count() as u32;
                entries.push(CapacityEntry {
                    frame: frame_id,
                    action: action.clone(),
                    max_count,
                });
            }
        }

        FacLayout::from_parts(populations, entries)
    }

    /// FAC capacity layout over the neighbors plus the planning agent.
    pub fn joint_layout(&self) -> FacLayout {
        self.neighbor_layout()
            .with_extra_agent(self.agent.frame, &self.agent.actions)
    }
}
