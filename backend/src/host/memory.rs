//! In-memory host and intent store
//!
//! [`InMemoryHost`] stands in for the game engine: it owns vessels, their
//! parts and the [`ResourceTank`]s the balancer mutates through shared
//! handles. [`MemoryIntentStore`] holds the UI's choices and is
//! serde-serializable so a host can persist it.

use crate::host::{AggregateId, HostAggregate, IntentStore, MembershipSignature, Situation};
use crate::models::container_index::ContainerMembers;
use crate::models::intent::TransferIntent;
use crate::models::link::ContainerId;
use crate::models::resource::{QuantityHandle, ResourceQuantity, ResourceTank};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Clone)]
struct Part {
    id: ContainerId,
    tanks: Vec<Rc<ResourceTank>>,
}

#[derive(Debug, Clone)]
struct Vessel {
    id: AggregateId,
    situation: Situation,
    parts: Vec<Part>,
}

/// Fake host holding any number of vessels, one of them active
///
/// # Example
/// ```
/// use fuel_balancer_core_rs::host::memory::InMemoryHost;
/// use fuel_balancer_core_rs::host::{HostAggregate, Situation};
/// use fuel_balancer_core_rs::ContainerId;
///
/// let mut host = InMemoryHost::new();
/// let vessel = host.add_vessel(Situation::Prelaunch);
/// host.add_tank(vessel, ContainerId(1), "LiquidFuel", 90.0, 100.0);
///
/// assert_eq!(host.active_aggregate(), Some(vessel));
/// assert_eq!(host.membership_signature(vessel).container_count, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryHost {
    vessels: Vec<Vessel>,
    active: Option<AggregateId>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty vessel; it becomes active if none is
    pub fn add_vessel(&mut self, situation: Situation) -> AggregateId {
        let id = AggregateId::new();
        self.vessels.push(Vessel {
            id,
            situation,
            parts: Vec::new(),
        });
        if self.active.is_none() {
            self.active = Some(id);
        }
        id
    }

    /// Switch (or clear) the active vessel
    ///
    /// Unknown ids clear the active vessel.
    pub fn set_active(&mut self, vessel: Option<AggregateId>) {
        self.active = vessel.filter(|id| self.vessel(*id).is_some());
    }

    pub fn set_situation(&mut self, vessel: AggregateId, situation: Situation) {
        if let Some(v) = self.vessel_mut(vessel) {
            v.situation = situation;
        }
    }

    /// Add a tank to a part, creating the part if needed
    ///
    /// Returns `None` if the vessel does not exist. A part holds at most
    /// one tank per resource name; adding a duplicate returns the existing
    /// tank unchanged.
    pub fn add_tank(
        &mut self,
        vessel: AggregateId,
        part: ContainerId,
        resource: &str,
        amount: f64,
        capacity: f64,
    ) -> Option<Rc<ResourceTank>> {
        let v = self.vessel_mut(vessel)?;
        let index = match v.parts.iter().position(|p| p.id == part) {
            Some(index) => index,
            None => {
                v.parts.push(Part {
                    id: part,
                    tanks: Vec::new(),
                });
                v.parts.len() - 1
            }
        };
        let part = &mut v.parts[index];
        if let Some(existing) = part.tanks.iter().find(|t| t.resource_name() == resource) {
            return Some(existing.clone());
        }
        let tank = ResourceTank::shared(resource, amount, capacity);
        part.tanks.push(tank.clone());
        Some(tank)
    }

    /// Add a part with no resources (counts toward membership)
    pub fn add_empty_part(&mut self, vessel: AggregateId, part: ContainerId) -> bool {
        match self.vessel_mut(vessel) {
            Some(v) if !v.parts.iter().any(|p| p.id == part) => {
                v.parts.push(Part {
                    id: part,
                    tanks: Vec::new(),
                });
                true
            }
            _ => false,
        }
    }

    /// Detach a part (decouple, explode, undock)
    pub fn remove_part(&mut self, vessel: AggregateId, part: ContainerId) -> bool {
        match self.vessel_mut(vessel) {
            Some(v) => {
                let before = v.parts.len();
                v.parts.retain(|p| p.id != part);
                v.parts.len() != before
            }
            None => false,
        }
    }

    pub fn tank(&self, vessel: AggregateId, part: ContainerId, resource: &str) -> Option<Rc<ResourceTank>> {
        self.vessel(vessel)?
            .parts
            .iter()
            .find(|p| p.id == part)?
            .tanks
            .iter()
            .find(|t| t.resource_name() == resource)
            .cloned()
    }

    /// Sum of one resource across a vessel
    pub fn total_amount(&self, vessel: AggregateId, resource: &str) -> f64 {
        self.vessel(vessel)
            .map(|v| {
                v.parts
                    .iter()
                    .flat_map(|p| p.tanks.iter())
                    .filter(|t| t.resource_name() == resource)
                    .map(|t| t.amount())
                    .sum()
            })
            .unwrap_or(0.0)
    }

    fn vessel(&self, id: AggregateId) -> Option<&Vessel> {
        self.vessels.iter().find(|v| v.id == id)
    }

    fn vessel_mut(&mut self, id: AggregateId) -> Option<&mut Vessel> {
        self.vessels.iter_mut().find(|v| v.id == id)
    }
}

impl HostAggregate for InMemoryHost {
    fn active_aggregate(&self) -> Option<AggregateId> {
        self.active
    }

    fn containers(&self, aggregate: AggregateId) -> Vec<ContainerMembers> {
        self.vessel(aggregate)
            .map(|v| {
                v.parts
                    .iter()
                    .map(|p| {
                        ContainerMembers::new(
                            p.id,
                            p.tanks.iter().map(|t| t.clone() as QuantityHandle).collect(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn membership_signature(&self, aggregate: AggregateId) -> MembershipSignature {
        let (container_count, situation) = self
            .vessel(aggregate)
            .map(|v| (v.parts.len(), v.situation))
            .unwrap_or((0, Situation::Prelaunch));
        MembershipSignature {
            aggregate,
            container_count,
            situation,
        }
    }
}

/// Intents and auto-balance flag for one resource type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceIntents {
    #[serde(default)]
    pub auto_balance: bool,

    #[serde(default)]
    pub intents: BTreeMap<ContainerId, TransferIntent>,
}

/// Intent store kept in memory
///
/// # Example
/// ```
/// use fuel_balancer_core_rs::host::memory::MemoryIntentStore;
/// use fuel_balancer_core_rs::host::IntentStore;
/// use fuel_balancer_core_rs::{ContainerId, TransferIntent};
///
/// let mut store = MemoryIntentStore::new();
/// store.set_intent("LiquidFuel", ContainerId(3), TransferIntent::Dump);
///
/// assert_eq!(store.intent("LiquidFuel", ContainerId(3)), TransferIntent::Dump);
/// assert_eq!(store.intent("LiquidFuel", ContainerId(4)), TransferIntent::None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryIntentStore {
    resources: BTreeMap<String, ResourceIntents>,
}

impl MemoryIntentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an intent; `None` clears the entry
    pub fn set_intent(&mut self, resource: &str, container: ContainerId, intent: TransferIntent) {
        let entry = self.resources.entry(resource.to_string()).or_default();
        if intent == TransferIntent::None {
            entry.intents.remove(&container);
        } else {
            entry.intents.insert(container, intent);
        }
    }

    pub fn set_auto_balance(&mut self, resource: &str, auto_balance: bool) {
        self.resources
            .entry(resource.to_string())
            .or_default()
            .auto_balance = auto_balance;
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl IntentStore for MemoryIntentStore {
    fn intent(&self, resource: &str, container: ContainerId) -> TransferIntent {
        self.resources
            .get(resource)
            .and_then(|entry| entry.intents.get(&container).copied())
            .unwrap_or_default()
    }

    fn auto_balance(&self, resource: &str) -> bool {
        self.resources
            .get(resource)
            .map(|entry| entry.auto_balance)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_tracks_parts_and_situation() {
        let mut host = InMemoryHost::new();
        let vessel = host.add_vessel(Situation::Prelaunch);
        host.add_tank(vessel, ContainerId(1), "LiquidFuel", 10.0, 100.0);
        let first = host.membership_signature(vessel);

        host.add_tank(vessel, ContainerId(1), "Oxidizer", 10.0, 100.0);
        assert_eq!(host.membership_signature(vessel), first);

        host.add_empty_part(vessel, ContainerId(2));
        assert_eq!(host.membership_signature(vessel).container_count, 2);

        host.set_situation(vessel, Situation::Flying);
        assert_eq!(host.membership_signature(vessel).situation, Situation::Flying);
    }

    #[test]
    fn test_containers_share_tank_handles() {
        let mut host = InMemoryHost::new();
        let vessel = host.add_vessel(Situation::Orbiting);
        let tank = host
            .add_tank(vessel, ContainerId(5), "Ore", 1.0, 10.0)
            .unwrap();

        let members = host.containers(vessel);
        assert_eq!(members.len(), 1);
        members[0].resources[0].set_amount(7.0);
        assert_eq!(tank.amount(), 7.0);
        assert_eq!(host.total_amount(vessel, "Ore"), 7.0);
    }

    #[test]
    fn test_remove_part_and_active_switching() {
        let mut host = InMemoryHost::new();
        let first = host.add_vessel(Situation::Flying);
        let second = host.add_vessel(Situation::Flying);
        assert_eq!(host.active_aggregate(), Some(first));

        host.add_tank(first, ContainerId(1), "Ore", 1.0, 10.0);
        assert!(host.remove_part(first, ContainerId(1)));
        assert!(!host.remove_part(first, ContainerId(1)));

        host.set_active(Some(second));
        assert_eq!(host.active_aggregate(), Some(second));
        host.set_active(Some(AggregateId::new()));
        assert_eq!(host.active_aggregate(), None);
    }

    #[test]
    fn test_intent_store_json_round_trip() {
        let mut store = MemoryIntentStore::new();
        store.set_intent("LiquidFuel", ContainerId(1), TransferIntent::In);
        store.set_intent("LiquidFuel", ContainerId(2), TransferIntent::Balance);
        store.set_auto_balance("Oxidizer", true);

        let json = store.to_json().unwrap();
        let restored = MemoryIntentStore::from_json(&json).unwrap();

        assert_eq!(restored, store);
        assert!(restored.auto_balance("Oxidizer"));
        assert_eq!(restored.intent("LiquidFuel", ContainerId(2)), TransferIntent::Balance);
    }

    #[test]
    fn test_clearing_intents() {
        let mut store = MemoryIntentStore::new();
        store.set_intent("Ore", ContainerId(1), TransferIntent::Dump);
        store.set_intent("Ore", ContainerId(1), TransferIntent::None);
        assert_eq!(store.intent("Ore", ContainerId(1)), TransferIntent::None);
        assert!(store.resources["Ore"].intents.is_empty());
    }
}
