//! Transfer event log
//!
//! Records every state change the driver makes so a host can audit or
//! display what happened on a tick. Zero-amount operations are not logged.
//!
//! # Example
//!
//! ```rust
//! use fuel_balancer_core_rs::models::event::{EventLog, TransferEvent};
//! use fuel_balancer_core_rs::ContainerId;
//!
//! let mut log = EventLog::new();
//! log.log(TransferEvent::Dumped {
//!     tick: 3,
//!     resource: "Ore".to_string(),
//!     container: ContainerId(12),
//!     amount: 10.0,
//! });
//!
//! assert_eq!(log.events_at_tick(3).len(), 1);
//! assert_eq!(log.events_for_resource("Ore").len(), 1);
//! ```

use crate::host::AggregateId;
use crate::models::link::ContainerId;

/// State change made during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// Index reconciled with a new membership signature
    MembershipRebuilt {
        tick: usize,
        aggregate: AggregateId,
        resources: usize,
        links: usize,
    },

    /// Host stopped reporting an active aggregate
    AggregateLost { tick: usize, aggregate: AggregateId },

    /// `TransferIn` target received `amount` from its donors
    TransferredIn {
        tick: usize,
        resource: String,
        container: ContainerId,
        amount: f64,
    },

    /// `TransferOut` source gave `amount` to its recipients
    TransferredOut {
        tick: usize,
        resource: String,
        container: ContainerId,
        amount: f64,
    },

    /// `DumpOut` jettisoned `amount`
    Dumped {
        tick: usize,
        resource: String,
        container: ContainerId,
        amount: f64,
    },

    /// Balance pass moved `amount` into under-filled participants
    Balanced {
        tick: usize,
        resource: String,
        participants: usize,
        amount: f64,
    },

    /// Balance pass gave up before the take phase finished
    BalanceAborted {
        tick: usize,
        resource: String,
        reason: String,
    },
}

impl TransferEvent {
    /// Get the tick number when this event occurred
    pub fn tick(&self) -> usize {
        match self {
            TransferEvent::MembershipRebuilt { tick, .. } => *tick,
            TransferEvent::AggregateLost { tick, .. } => *tick,
            TransferEvent::TransferredIn { tick, .. } => *tick,
            TransferEvent::TransferredOut { tick, .. } => *tick,
            TransferEvent::Dumped { tick, .. } => *tick,
            TransferEvent::Balanced { tick, .. } => *tick,
            TransferEvent::BalanceAborted { tick, .. } => *tick,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            TransferEvent::MembershipRebuilt { .. } => "MembershipRebuilt",
            TransferEvent::AggregateLost { .. } => "AggregateLost",
            TransferEvent::TransferredIn { .. } => "TransferredIn",
            TransferEvent::TransferredOut { .. } => "TransferredOut",
            TransferEvent::Dumped { .. } => "Dumped",
            TransferEvent::Balanced { .. } => "Balanced",
            TransferEvent::BalanceAborted { .. } => "BalanceAborted",
        }
    }

    /// Resource name if the event concerns one resource type
    pub fn resource(&self) -> Option<&str> {
        match self {
            TransferEvent::TransferredIn { resource, .. } => Some(resource),
            TransferEvent::TransferredOut { resource, .. } => Some(resource),
            TransferEvent::Dumped { resource, .. } => Some(resource),
            TransferEvent::Balanced { resource, .. } => Some(resource),
            TransferEvent::BalanceAborted { resource, .. } => Some(resource),
            _ => None,
        }
    }

    /// Container if the event concerns a single link
    pub fn container(&self) -> Option<ContainerId> {
        match self {
            TransferEvent::TransferredIn { container, .. } => Some(*container),
            TransferEvent::TransferredOut { container, .. } => Some(*container),
            TransferEvent::Dumped { container, .. } => Some(*container),
            _ => None,
        }
    }
}

/// Event log for storing and querying transfer events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<TransferEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: TransferEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[TransferEvent] {
        &self.events
    }

    /// Get events for a specific tick
    pub fn events_at_tick(&self, tick: usize) -> Vec<&TransferEvent> {
        self.events.iter().filter(|e| e.tick() == tick).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&TransferEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events for a specific resource type
    pub fn events_for_resource(&self, resource: &str) -> Vec<&TransferEvent> {
        self.events
            .iter()
            .filter(|e| e.resource() == Some(resource))
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Remove and return every logged event, oldest first
    pub fn drain(&mut self) -> Vec<TransferEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dumped(tick: usize, resource: &str) -> TransferEvent {
        TransferEvent::Dumped {
            tick,
            resource: resource.to_string(),
            container: ContainerId(1),
            amount: 1.0,
        }
    }

    #[test]
    fn test_event_accessors() {
        let event = TransferEvent::TransferredIn {
            tick: 4,
            resource: "LiquidFuel".to_string(),
            container: ContainerId(9),
            amount: 2.5,
        };
        assert_eq!(event.tick(), 4);
        assert_eq!(event.event_type(), "TransferredIn");
        assert_eq!(event.resource(), Some("LiquidFuel"));
        assert_eq!(event.container(), Some(ContainerId(9)));

        let lost = TransferEvent::AggregateLost {
            tick: 5,
            aggregate: AggregateId::new(),
        };
        assert_eq!(lost.resource(), None);
        assert_eq!(lost.container(), None);
    }

    #[test]
    fn test_event_log_queries() {
        let mut log = EventLog::new();
        log.log(dumped(1, "Ore"));
        log.log(dumped(1, "LiquidFuel"));
        log.log(TransferEvent::Balanced {
            tick: 2,
            resource: "Ore".to_string(),
            participants: 3,
            amount: 4.0,
        });

        assert_eq!(log.len(), 3);
        assert_eq!(log.events_at_tick(1).len(), 2);
        assert_eq!(log.events_of_type("Balanced").len(), 1);
        assert_eq!(log.events_for_resource("Ore").len(), 2);

        let drained = log.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[2].event_type(), "Balanced");
        assert!(log.is_empty());

        log.log(dumped(3, "Ore"));
        log.clear();
        assert!(log.is_empty());
    }
}
