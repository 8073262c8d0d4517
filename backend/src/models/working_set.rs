//! Resource working set
//!
//! All links for one resource type within the current aggregate.
//!
//! # Critical Invariants
//!
//! 1. At most one link per container
//! 2. Links are kept sorted by [`ContainerId`] so every pass iterates in
//!    the same order
//! 3. An empty working set is removed by the index

use crate::models::link::{ContainerId, ContainerResourceLink};
use std::collections::HashSet;

/// What [`ResourceWorkingSet::upsert`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// New container
    Added,
    /// Container known, but backed by a different quantity now
    Replaced,
    /// Container already linked to this quantity
    Unchanged,
}

/// Links of one resource type
#[derive(Debug, Clone)]
pub struct ResourceWorkingSet {
    resource_name: String,
    links: Vec<ContainerResourceLink>,
    auto_balance: bool,
}

impl ResourceWorkingSet {
    /// Empty working set, auto-balance off
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            links: Vec::new(),
            auto_balance: false,
        }
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Links ordered by container id
    pub fn links(&self) -> &[ContainerResourceLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// When true, `None`-intent links are balance participants
    pub fn auto_balance(&self) -> bool {
        self.auto_balance
    }

    pub fn set_auto_balance(&mut self, auto_balance: bool) {
        self.auto_balance = auto_balance;
    }

    pub fn contains(&self, container: ContainerId) -> bool {
        self.position(container).is_ok()
    }

    pub fn link(&self, container: ContainerId) -> Option<&ContainerResourceLink> {
        self.position(container).ok().map(|i| &self.links[i])
    }

    pub fn link_mut(&mut self, container: ContainerId) -> Option<&mut ContainerResourceLink> {
        match self.position(container) {
            Ok(i) => Some(&mut self.links[i]),
            Err(_) => None,
        }
    }

    /// Insert a link in container order
    ///
    /// Returns `false` (and keeps the existing link) if the container is
    /// already present.
    pub fn insert(&mut self, link: ContainerResourceLink) -> bool {
        match self.position(link.container()) {
            Ok(_) => false,
            Err(i) => {
                self.links.insert(i, link);
                true
            }
        }
    }

    /// Insert a link, or swap it in if the container's quantity changed
    ///
    /// A replaced link starts over with `intent = None` and no selection.
    pub fn upsert(&mut self, link: ContainerResourceLink) -> Upsert {
        match self.position(link.container()) {
            Ok(i) if self.links[i].holds(link.quantity()) => Upsert::Unchanged,
            Ok(i) => {
                self.links[i] = link;
                Upsert::Replaced
            }
            Err(i) => {
                self.links.insert(i, link);
                Upsert::Added
            }
        }
    }

    /// Drop links whose container is not in `members`
    ///
    /// Returns the number of links removed.
    pub fn retain_members(&mut self, members: &HashSet<ContainerId>) -> usize {
        let before = self.links.len();
        self.links.retain(|link| members.contains(&link.container()));
        before - self.links.len()
    }

    /// Links that take part in the balance pass
    ///
    /// `Balance` links always; `None` links when auto-balance is on.
    pub fn balance_participants(&self) -> Vec<&ContainerResourceLink> {
        self.links
            .iter()
            .filter(|link| link.intent().joins_balance(self.auto_balance))
            .collect()
    }

    /// Sum of amounts across every link
    pub fn total_amount(&self) -> f64 {
        self.links.iter().map(|link| link.amount()).sum()
    }

    /// Sum of capacities across every link
    pub fn total_capacity(&self) -> f64 {
        self.links.iter().map(|link| link.capacity()).sum()
    }

    fn position(&self, container: ContainerId) -> Result<usize, usize> {
        self.links
            .binary_search_by(|link| link.container().cmp(&container))
    }
}
