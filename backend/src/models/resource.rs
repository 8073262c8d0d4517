//! Resource quantity handles
//!
//! The host owns the live amounts. The core reaches them through
//! [`ResourceQuantity`], reading `amount`/`capacity` and writing `amount`
//! in place. Handles are shared (`Rc`) between the host and the index, so
//! `set_amount` takes `&self` and implementations use interior mutability.
//!
//! [`ResourceTank`] is the in-memory implementation used by the fake host
//! and by tests.
//!
//! # Critical Invariants
//!
//! 1. The core never mutates `capacity`
//! 2. The core only writes amounts inside `[0, capacity]`

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A host-owned quantity of one resource inside one container
pub trait ResourceQuantity {
    /// Resource type name (working-set key)
    fn resource_name(&self) -> &str;

    /// Current amount
    fn amount(&self) -> f64;

    /// Maximum amount
    fn capacity(&self) -> f64;

    /// Overwrite the current amount
    fn set_amount(&self, amount: f64);
}

/// Shared handle the index stores per link
pub type QuantityHandle = Rc<dyn ResourceQuantity>;

/// Check a quantity is usable: named, finite, non-negative
pub(crate) fn is_well_formed(quantity: &dyn ResourceQuantity) -> bool {
    let capacity = quantity.capacity();
    let amount = quantity.amount();
    !quantity.resource_name().is_empty()
        && capacity.is_finite()
        && capacity >= 0.0
        && amount.is_finite()
        && amount >= 0.0
}

/// In-memory resource quantity
///
/// # Example
/// ```
/// use fuel_balancer_core_rs::{ResourceQuantity, ResourceTank};
///
/// let tank = ResourceTank::shared("LiquidFuel", 40.0, 100.0);
/// tank.set_amount(55.0);
/// assert_eq!(tank.amount(), 55.0);
/// assert_eq!(tank.capacity(), 100.0);
/// ```
pub struct ResourceTank {
    name: String,
    amount: Cell<f64>,
    capacity: f64,
}

impl ResourceTank {
    /// Create a tank
    pub fn new(name: impl Into<String>, amount: f64, capacity: f64) -> Self {
        Self {
            name: name.into(),
            amount: Cell::new(amount),
            capacity,
        }
    }

    /// Create a tank behind an `Rc`, ready to hand out as a [`QuantityHandle`]
    pub fn shared(name: impl Into<String>, amount: f64, capacity: f64) -> Rc<Self> {
        Rc::new(Self::new(name, amount, capacity))
    }
}

impl ResourceQuantity for ResourceTank {
    fn resource_name(&self) -> &str {
        &self.name
    }

    fn amount(&self) -> f64 {
        self.amount.get()
    }

    fn capacity(&self) -> f64 {
        self.capacity
    }

    fn set_amount(&self, amount: f64) {
        self.amount.set(amount);
    }
}

impl fmt::Debug for ResourceTank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTank")
            .field("name", &self.name)
            .field("amount", &self.amount.get())
            .field("capacity", &self.capacity)
            .finish()
    }
}
