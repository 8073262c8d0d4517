//! Container Index
//!
//! Maps each resource type present in the aggregate to its
//! [`ResourceWorkingSet`].
//!
//! # Rebuild
//!
//! Membership is diffed, not recreated, so links that survive a rebuild
//! keep their handle, intent and selection flag:
//!
//! 1. Drop links whose container left the aggregate; drop empty sets
//! 2. Append links for newly observed (container, resource) pairs with
//!    `intent = None`, creating sets for new resource names
//! 3. Replace links whose container id is known but whose quantity is a
//!    different host object (another aggregate reusing the id)
//!
//! When to rebuild is the driver's decision (membership signature change).
//!
//! # Usage
//!
//! ```rust
//! use fuel_balancer_core_rs::{ContainerId, ContainerIndex, ContainerMembers, ResourceTank};
//!
//! let mut index = ContainerIndex::new();
//! index.rebuild(&[ContainerMembers::new(
//!     ContainerId(1),
//!     vec![ResourceTank::shared("LiquidFuel", 50.0, 100.0)],
//! )]);
//!
//! assert_eq!(index.num_resources(), 1);
//! assert_eq!(index.working_set("LiquidFuel").unwrap().len(), 1);
//! ```

use crate::host::IntentStore;
use crate::models::link::{ContainerId, ContainerResourceLink};
use crate::models::resource::{is_well_formed, QuantityHandle};
use crate::models::working_set::{ResourceWorkingSet, Upsert};
use std::collections::{BTreeMap, HashSet};

/// One aggregate member and the resource quantities it holds
#[derive(Clone)]
pub struct ContainerMembers {
    pub container: ContainerId,
    pub resources: Vec<QuantityHandle>,
}

impl ContainerMembers {
    pub fn new(container: ContainerId, resources: Vec<QuantityHandle>) -> Self {
        Self {
            container,
            resources,
        }
    }
}

/// What a rebuild changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    pub links_added: usize,
    pub links_removed: usize,

    /// Known containers now backed by a different host quantity
    pub links_replaced: usize,

    pub sets_created: usize,
    pub sets_removed: usize,

    /// Malformed quantities ignored
    pub skipped: usize,
}

/// Resource name → working set
#[derive(Debug, Clone, Default)]
pub struct ContainerIndex {
    sets: BTreeMap<String, ResourceWorkingSet>,
}

impl ContainerIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile the index with current aggregate membership
    ///
    /// Never touches amounts.
    pub fn rebuild(&mut self, members: &[ContainerMembers]) -> RebuildSummary {
        let mut summary = RebuildSummary::default();

        let present: HashSet<ContainerId> = members.iter().map(|m| m.container).collect();
        for set in self.sets.values_mut() {
            summary.links_removed += set.retain_members(&present);
        }
        let before = self.sets.len();
        self.sets.retain(|_, set| !set.is_empty());
        summary.sets_removed = before - self.sets.len();

        for member in members {
            for quantity in &member.resources {
                if !is_well_formed(quantity.as_ref()) {
                    summary.skipped += 1;
                    continue;
                }

                let name = quantity.resource_name();
                let set = self.sets.entry(name.to_string()).or_insert_with(|| {
                    summary.sets_created += 1;
                    ResourceWorkingSet::new(name)
                });

                match set.upsert(ContainerResourceLink::new(member.container, quantity.clone())) {
                    Upsert::Added => summary.links_added += 1,
                    Upsert::Replaced => summary.links_replaced += 1,
                    Upsert::Unchanged => {}
                }
            }
        }

        summary
    }

    /// Copy intents and auto-balance flags from the store into the links
    pub fn apply_intents(&mut self, store: &dyn IntentStore) {
        for (name, set) in self.sets.iter_mut() {
            set.set_auto_balance(store.auto_balance(name));
            let containers: Vec<ContainerId> = set.links().iter().map(|l| l.container()).collect();
            for container in containers {
                if let Some(link) = set.link_mut(container) {
                    link.set_intent(store.intent(name, container));
                }
            }
        }
    }

    /// Toggle the UI-only selection flag
    ///
    /// Returns `false` if no such link exists.
    pub fn set_selected(&mut self, resource: &str, container: ContainerId, selected: bool) -> bool {
        match self
            .sets
            .get_mut(resource)
            .and_then(|set| set.link_mut(container))
        {
            Some(link) => {
                link.set_selected(selected);
                true
            }
            None => false,
        }
    }

    pub fn working_set(&self, resource: &str) -> Option<&ResourceWorkingSet> {
        self.sets.get(resource)
    }

    pub fn working_set_mut(&mut self, resource: &str) -> Option<&mut ResourceWorkingSet> {
        self.sets.get_mut(resource)
    }

    /// Working sets in resource-name order
    pub fn working_sets(&self) -> impl Iterator<Item = &ResourceWorkingSet> {
        self.sets.values()
    }

    pub fn resource_names(&self) -> Vec<&str> {
        self.sets.keys().map(|k| k.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn num_resources(&self) -> usize {
        self.sets.len()
    }

    /// Total links across all working sets
    pub fn num_links(&self) -> usize {
        self.sets.values().map(|set| set.len()).sum()
    }
}
