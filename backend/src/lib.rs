//! Fuel Balancer Core - Rust Engine
//!
//! Redistributes bounded, fungible resources across the containers of one
//! aggregate, once per fixed simulation step.
//!
//! # Architecture
//!
//! - **core**: Step clock, flow configuration and per-tick flow budget
//! - **models**: Domain types (intents, links, working sets, container index, events)
//! - **host**: Interfaces to the host environment, plus in-memory fakes
//! - **transfer**: Directed transfer engine and balance engine
//! - **orchestrator**: Tick driver
//!
//! # Critical Invariants
//!
//! 1. Every link satisfies `0 ≤ amount ≤ capacity` after every operation
//! 2. Only `DumpOut` destroys mass
//! 3. Iteration order is deterministic (resource name, then container id)

// Module declarations
pub mod core;
pub mod host;
pub mod models;
pub mod orchestrator;
pub mod transfer;

// Re-exports for convenience
pub use crate::core::flow::{ConfigError, FlowBudget, FlowConfig};
pub use crate::core::time::StepClock;
pub use host::{AggregateId, HostAggregate, IntentStore, MembershipSignature, Situation};
pub use models::{
    container_index::{ContainerIndex, ContainerMembers, RebuildSummary},
    event::{EventLog, TransferEvent},
    intent::TransferIntent,
    link::{ContainerId, ContainerResourceLink},
    resource::{QuantityHandle, ResourceQuantity, ResourceTank},
    working_set::ResourceWorkingSet,
};
pub use orchestrator::{DriverError, DriverState, TickDriver, TickResult};
pub use transfer::{BalanceError, BalanceOutcome};
