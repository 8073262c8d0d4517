//! Host collaborator interfaces
//!
//! The balancer never owns the aggregate or its containers. Each tick it
//! asks the host for the active aggregate, its membership signature and
//! (on change) its containers, and reads intents from an [`IntentStore`].
//!
//! [`memory`] provides in-memory implementations for tests and embedding.

pub mod memory;

use crate::models::container_index::ContainerMembers;
use crate::models::intent::TransferIntent;
use crate::models::link::ContainerId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of an aggregate (vessel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AggregateId(pub Uuid);

impl AggregateId {
    /// Fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Situational state of the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Situation {
    Prelaunch,
    Landed,
    Splashed,
    Flying,
    SubOrbital,
    Orbiting,
    Escaping,
    Docked,
}

impl Situation {
    /// Still on the ground before (or without) flight
    pub fn is_prelaunch(self) -> bool {
        matches!(self, Situation::Prelaunch | Situation::Landed)
    }
}

/// Comparable summary of aggregate membership
///
/// The driver rebuilds its index whenever this changes: a different
/// aggregate, a different container count, or a different situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MembershipSignature {
    pub aggregate: AggregateId,
    pub container_count: usize,
    pub situation: Situation,
}

/// Source of the live aggregate and its containers
pub trait HostAggregate {
    /// Aggregate currently under control, if any
    fn active_aggregate(&self) -> Option<AggregateId>;

    /// Every member container with its resource quantities
    fn containers(&self, aggregate: AggregateId) -> Vec<ContainerMembers>;

    /// Signature used to detect membership changes
    fn membership_signature(&self, aggregate: AggregateId) -> MembershipSignature;
}

/// Per-resource, per-container directives chosen outside the core
pub trait IntentStore {
    /// Intent for one container-resource pair (`None` when unset)
    fn intent(&self, resource: &str, container: ContainerId) -> TransferIntent;

    /// Whether `None` links of this resource join balancing
    fn auto_balance(&self, resource: &str) -> bool;
}
