//! Container-resource link
//!
//! One container's participation in one resource type's working set.
//! Every amount change made by the engines goes through [`credit`] or
//! [`debit`], which clamp against headroom or available amount before
//! writing, so `0 ≤ amount ≤ capacity` holds by construction.
//!
//! [`credit`]: ContainerResourceLink::credit
//! [`debit`]: ContainerResourceLink::debit

use crate::models::intent::TransferIntent;
use crate::models::resource::QuantityHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Stable container identity (the host's persistent part id)
///
/// Ordering by id is the deterministic iteration order of a working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub u32);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "part#{}", self.0)
    }
}

/// Link between a container and one of its resource quantities
#[derive(Clone)]
pub struct ContainerResourceLink {
    container: ContainerId,
    quantity: QuantityHandle,
    intent: TransferIntent,
    is_selected: bool,
}

impl ContainerResourceLink {
    /// New link with `intent = None`
    pub fn new(container: ContainerId, quantity: QuantityHandle) -> Self {
        Self {
            container,
            quantity,
            intent: TransferIntent::None,
            is_selected: false,
        }
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }

    pub fn resource_name(&self) -> &str {
        self.quantity.resource_name()
    }

    /// Host quantity behind this link
    pub fn quantity(&self) -> &QuantityHandle {
        &self.quantity
    }

    /// Whether this link reads and writes the very quantity behind `handle`
    pub fn holds(&self, handle: &QuantityHandle) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.quantity) as *const (),
            Rc::as_ptr(handle) as *const (),
        )
    }

    pub fn amount(&self) -> f64 {
        self.quantity.amount()
    }

    pub fn capacity(&self) -> f64 {
        self.quantity.capacity()
    }

    /// Remaining room, never negative
    pub fn headroom(&self) -> f64 {
        (self.capacity() - self.amount()).max(0.0)
    }

    /// `amount / capacity`, `None` when capacity is zero
    pub fn percent_full(&self) -> Option<f64> {
        let capacity = self.capacity();
        if capacity > 0.0 {
            Some(self.amount() / capacity)
        } else {
            None
        }
    }

    pub fn intent(&self) -> TransferIntent {
        self.intent
    }

    pub fn set_intent(&mut self, intent: TransferIntent) {
        self.intent = intent;
    }

    /// UI highlight flag, no effect on transfers
    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.is_selected = selected;
    }

    /// Add up to `amount`, clamped to headroom
    ///
    /// Returns the amount actually added.
    pub fn credit(&self, amount: f64) -> f64 {
        let added = amount.min(self.headroom()).max(0.0);
        if added > 0.0 {
            self.quantity
                .set_amount((self.amount() + added).min(self.capacity()));
        }
        added
    }

    /// Remove up to `amount`, clamped to the current amount
    ///
    /// Returns the amount actually removed.
    pub fn debit(&self, amount: f64) -> f64 {
        let current = self.amount();
        let removed = amount.min(current).max(0.0);
        if removed > 0.0 {
            self.quantity.set_amount((current - removed).max(0.0));
        }
        removed
    }
}

impl fmt::Debug for ContainerResourceLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerResourceLink")
            .field("container", &self.container)
            .field("resource", &self.resource_name())
            .field("amount", &self.amount())
            .field("capacity", &self.capacity())
            .field("intent", &self.intent)
            .field("is_selected", &self.is_selected)
            .finish()
    }
}
