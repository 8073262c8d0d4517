//! Tick Driver
//!
//! Owns the balancer's working state for one session and advances it one
//! fixed simulation step at a time:
//!
//! ```text
//! For each step:
//! 1. Ask the host for the active aggregate (none → idle step)
//! 2. Rebuild the container index if the membership signature changed
//! 3. Pull intents and auto-balance flags from the intent store
//! 4. Per resource type (name order):
//!    a. Directed transfers (In / Out / Dump) in container order
//!    b. One balance pass over the derived participant subset
//! 5. Advance the step clock
//! ```
//!
//! Resource types never interact. Every amount change is written straight
//! into the host's quantities; there is no staged state.
//!
//! # Example
//!
//! ```rust
//! use fuel_balancer_core_rs::host::memory::{InMemoryHost, MemoryIntentStore};
//! use fuel_balancer_core_rs::host::Situation;
//! use fuel_balancer_core_rs::{ContainerId, FlowConfig, TickDriver, TransferIntent};
//!
//! let mut host = InMemoryHost::new();
//! let vessel = host.add_vessel(Situation::Flying);
//! let tank = host.add_tank(vessel, ContainerId(1), "Ore", 40.0, 100.0).unwrap();
//!
//! let mut intents = MemoryIntentStore::new();
//! intents.set_intent("Ore", ContainerId(1), TransferIntent::Dump);
//!
//! let mut driver = TickDriver::new(FlowConfig::new(10.0, 1.0).unwrap()).unwrap();
//! let result = driver.tick(&host, &intents, 1.0).unwrap();
//!
//! assert!(result.rebuilt);
//! assert_eq!(result.dumped, 10.0);
//! ```

use crate::core::flow::{ConfigError, FlowConfig};
use crate::core::time::StepClock;
use crate::host::{AggregateId, HostAggregate, IntentStore, MembershipSignature};
use crate::models::container_index::ContainerIndex;
use crate::models::event::{EventLog, TransferEvent};
use crate::models::intent::TransferIntent;
use crate::transfer::{balance_working_set, execute_intent};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors returned by [`TickDriver`]
#[derive(Debug, Error, PartialEq)]
pub enum DriverError {
    #[error("delta_time must be finite and non-negative, got {0}")]
    InvalidDeltaTime(f64),

    #[error("Invalid flow config: {0}")]
    Config(#[from] ConfigError),
}

/// Driver state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverState {
    /// No active aggregate; steps are idle
    NoVessel,

    /// Index reflects the aggregate with this signature
    Tracking(MembershipSignature),
}

/// Result of a single step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickResult {
    /// Tick number
    pub tick: usize,

    /// Active aggregate, `None` on idle steps
    pub aggregate: Option<AggregateId>,

    /// Index was rebuilt this step
    pub rebuilt: bool,

    /// Moved by `TransferIn`/`TransferOut` (mass conserved)
    pub transferred: f64,

    /// Destroyed by `DumpOut`
    pub dumped: f64,

    /// Given to under-filled balance participants
    pub balanced: f64,

    /// Balance passes aborted by an internal failure
    pub balance_failures: usize,
}

/// Per-session balancer state, advanced once per fixed step
#[derive(Debug)]
pub struct TickDriver {
    state: DriverState,
    index: ContainerIndex,
    flow_config: FlowConfig,
    clock: StepClock,
    event_log: EventLog,
}

impl TickDriver {
    /// Create a driver with a validated flow configuration
    pub fn new(flow_config: FlowConfig) -> Result<Self, DriverError> {
        flow_config.validate()?;
        Ok(Self {
            state: DriverState::NoVessel,
            index: ContainerIndex::new(),
            flow_config,
            clock: StepClock::new(),
            event_log: EventLog::new(),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Get current tick number
    pub fn current_tick(&self) -> usize {
        self.clock.current_tick()
    }

    pub fn clock(&self) -> &StepClock {
        &self.clock
    }

    /// Working sets per resource, for the intent-selection UI
    pub fn resources(&self) -> &ContainerIndex {
        &self.index
    }

    /// Mutable index access for UI-only state (selection)
    pub fn resources_mut(&mut self) -> &mut ContainerIndex {
        &mut self.index
    }

    pub fn flow_config(&self) -> &FlowConfig {
        &self.flow_config
    }

    /// Replace the flow configuration; takes effect on the next step
    pub fn set_flow_config(&mut self, flow_config: FlowConfig) -> Result<(), DriverError> {
        flow_config.validate()?;
        self.flow_config = flow_config;
        Ok(())
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Hand every event logged so far to the host and start an empty log
    ///
    /// The driver keeps events until drained, so a long-running host
    /// should call this regularly.
    pub fn drain_events(&mut self) -> Vec<TransferEvent> {
        self.event_log.drain()
    }

    /// Aggregate being tracked
    pub fn aggregate(&self) -> Option<AggregateId> {
        match self.state {
            DriverState::Tracking(signature) => Some(signature.aggregate),
            DriverState::NoVessel => None,
        }
    }

    /// Tracked aggregate is still on the ground (prelaunch or landed)
    pub fn is_prelaunch(&self) -> bool {
        match self.state {
            DriverState::Tracking(signature) => signature.situation.is_prelaunch(),
            DriverState::NoVessel => false,
        }
    }

    // ========================================================================
    // Tick Loop
    // ========================================================================

    /// Advance one fixed step of `delta_time` seconds
    ///
    /// # Returns
    ///
    /// * `Ok(TickResult)` - Step executed (possibly idle)
    /// * `Err(DriverError)` - `delta_time` was negative or not finite;
    ///   nothing was touched
    pub fn tick(
        &mut self,
        host: &dyn HostAggregate,
        intents: &dyn IntentStore,
        delta_time: f64,
    ) -> Result<TickResult, DriverError> {
        if !(delta_time.is_finite() && delta_time >= 0.0) {
            return Err(DriverError::InvalidDeltaTime(delta_time));
        }

        let tick = self.clock.current_tick();
        let mut result = TickResult {
            tick,
            ..Default::default()
        };

        // STEP 1: ACTIVE AGGREGATE
        let aggregate = match host.active_aggregate() {
            Some(aggregate) => aggregate,
            None => {
                if let DriverState::Tracking(signature) = self.state {
                    info!(tick, aggregate = %signature.aggregate, "active aggregate lost");
                    self.event_log.log(TransferEvent::AggregateLost {
                        tick,
                        aggregate: signature.aggregate,
                    });
                }
                debug!(tick, "no active aggregate, idle step");
                self.state = DriverState::NoVessel;
                self.clock.advance(delta_time);
                return Ok(result);
            }
        };
        result.aggregate = Some(aggregate);

        // STEP 2: MEMBERSHIP
        let signature = host.membership_signature(aggregate);
        if self.state != DriverState::Tracking(signature) {
            let members = host.containers(aggregate);
            let summary = self.index.rebuild(&members);
            info!(
                tick,
                aggregate = %aggregate,
                containers = members.len(),
                situation = ?signature.situation,
                resources = self.index.num_resources(),
                links = self.index.num_links(),
                added = summary.links_added,
                removed = summary.links_removed,
                replaced = summary.links_replaced,
                skipped = summary.skipped,
                "rebuilt resource lists"
            );
            self.event_log.log(TransferEvent::MembershipRebuilt {
                tick,
                aggregate,
                resources: self.index.num_resources(),
                links: self.index.num_links(),
            });
            self.state = DriverState::Tracking(signature);
            result.rebuilt = true;
        }

        // STEP 3: INTENTS
        self.index.apply_intents(intents);

        // STEP 4: TRANSFERS, THEN BALANCE, PER RESOURCE
        let budget = self.flow_config.budget(delta_time);
        for set in self.index.working_sets() {
            for link in set.links() {
                let intent = link.intent();
                if !intent.is_directed() {
                    continue;
                }
                let moved = execute_intent(set, link.container(), budget);
                if moved <= 0.0 {
                    continue;
                }

                let resource = set.resource_name().to_string();
                let container = link.container();
                let event = match intent {
                    TransferIntent::In => {
                        result.transferred += moved;
                        TransferEvent::TransferredIn {
                            tick,
                            resource,
                            container,
                            amount: moved,
                        }
                    }
                    TransferIntent::Out => {
                        result.transferred += moved;
                        TransferEvent::TransferredOut {
                            tick,
                            resource,
                            container,
                            amount: moved,
                        }
                    }
                    _ => {
                        result.dumped += moved;
                        TransferEvent::Dumped {
                            tick,
                            resource,
                            container,
                            amount: moved,
                        }
                    }
                };
                self.event_log.log(event);
            }

            match balance_working_set(set, budget) {
                Ok(outcome) => {
                    if outcome.given > 0.0 {
                        result.balanced += outcome.given;
                        self.event_log.log(TransferEvent::Balanced {
                            tick,
                            resource: set.resource_name().to_string(),
                            participants: outcome.participants,
                            amount: outcome.given,
                        });
                    }
                }
                Err(e) => {
                    warn!(tick, resource = set.resource_name(), error = %e, "balance pass aborted");
                    result.balance_failures += 1;
                    self.event_log.log(TransferEvent::BalanceAborted {
                        tick,
                        resource: set.resource_name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }

            debug!(
                tick,
                resource = set.resource_name(),
                total = set.total_amount(),
                capacity = set.total_capacity(),
                "resource totals"
            );
        }

        // STEP 5: ADVANCE TIME
        self.clock.advance(delta_time);

        Ok(result)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{InMemoryHost, MemoryIntentStore};
    use crate::host::Situation;
    use crate::models::link::ContainerId;

    fn create_driver() -> TickDriver {
        TickDriver::new(FlowConfig::new(10.0, 1.0).unwrap()).unwrap()
    }

    #[test]
    fn test_driver_creation() {
        let driver = create_driver();
        assert_eq!(driver.state(), DriverState::NoVessel);
        assert_eq!(driver.current_tick(), 0);
        assert!(driver.resources().is_empty());
        assert!(!driver.is_prelaunch());
    }

    #[test]
    fn test_driver_rejects_invalid_config() {
        let config = FlowConfig {
            max_flow_rate: 0.0,
            rate_multiplier: 1.0,
        };
        assert!(matches!(
            TickDriver::new(config),
            Err(DriverError::Config(ConfigError::NonPositiveFlowRate(_)))
        ));

        let mut driver = create_driver();
        assert!(driver
            .set_flow_config(FlowConfig {
                max_flow_rate: 1.0,
                rate_multiplier: -2.0,
            })
            .is_err());
        assert_eq!(driver.flow_config().rate_multiplier, 1.0);
    }

    #[test]
    fn test_invalid_delta_time_touches_nothing() {
        let host = InMemoryHost::new();
        let intents = MemoryIntentStore::new();
        let mut driver = create_driver();

        assert_eq!(
            driver.tick(&host, &intents, -0.1),
            Err(DriverError::InvalidDeltaTime(-0.1))
        );
        assert!(driver.tick(&host, &intents, f64::NAN).is_err());
        assert_eq!(driver.current_tick(), 0);
    }

    #[test]
    fn test_idle_without_aggregate() {
        let host = InMemoryHost::new();
        let intents = MemoryIntentStore::new();
        let mut driver = create_driver();

        let result = driver.tick(&host, &intents, 0.02).unwrap();

        assert_eq!(result.aggregate, None);
        assert!(!result.rebuilt);
        assert_eq!(driver.state(), DriverState::NoVessel);
        assert_eq!(driver.current_tick(), 1);
        assert!(driver.event_log().is_empty());
    }

    #[test]
    fn test_rebuild_only_on_signature_change() {
        let mut host = InMemoryHost::new();
        let vessel = host.add_vessel(Situation::Prelaunch);
        host.add_tank(vessel, ContainerId(1), "LiquidFuel", 10.0, 100.0);
        let intents = MemoryIntentStore::new();
        let mut driver = create_driver();

        assert!(driver.tick(&host, &intents, 0.02).unwrap().rebuilt);
        assert!(!driver.tick(&host, &intents, 0.02).unwrap().rebuilt);
        assert!(driver.is_prelaunch());

        host.set_situation(vessel, Situation::Flying);
        assert!(driver.tick(&host, &intents, 0.02).unwrap().rebuilt);
        assert!(!driver.is_prelaunch());

        host.add_tank(vessel, ContainerId(2), "LiquidFuel", 0.0, 100.0);
        assert!(driver.tick(&host, &intents, 0.02).unwrap().rebuilt);
        assert_eq!(driver.resources().working_set("LiquidFuel").unwrap().len(), 2);
        assert_eq!(driver.event_log().events_of_type("MembershipRebuilt").len(), 3);
    }

    #[test]
    fn test_drain_events_empties_the_log() {
        let mut host = InMemoryHost::new();
        let vessel = host.add_vessel(Situation::Flying);
        host.add_tank(vessel, ContainerId(1), "Ore", 100.0, 100.0);
        let mut intents = MemoryIntentStore::new();
        intents.set_intent("Ore", ContainerId(1), crate::TransferIntent::Dump);
        let mut driver = create_driver();

        for _ in 0..3 {
            driver.tick(&host, &intents, 0.5).unwrap();
        }
        let drained = driver.drain_events();
        assert_eq!(drained.len(), 4);
        assert_eq!(drained[0].event_type(), "MembershipRebuilt");
        assert!(driver.event_log().is_empty());

        driver.tick(&host, &intents, 0.5).unwrap();
        let drained = driver.drain_events();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].tick(), 3);
    }

    #[test]
    fn test_losing_aggregate_logs_event() {
        let mut host = InMemoryHost::new();
        let vessel = host.add_vessel(Situation::Orbiting);
        host.add_tank(vessel, ContainerId(1), "Ore", 10.0, 100.0);
        let intents = MemoryIntentStore::new();
        let mut driver = create_driver();

        driver.tick(&host, &intents, 0.02).unwrap();
        assert_eq!(driver.aggregate(), Some(vessel));

        host.set_active(None);
        driver.tick(&host, &intents, 0.02).unwrap();
        assert_eq!(driver.state(), DriverState::NoVessel);
        assert_eq!(driver.event_log().events_of_type("AggregateLost").len(), 1);

        // Re-acquiring the same vessel rebuilds
        host.set_active(Some(vessel));
        assert!(driver.tick(&host, &intents, 0.02).unwrap().rebuilt);
    }
}
