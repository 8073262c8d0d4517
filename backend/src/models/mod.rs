//! Domain models for the resource balancer

pub mod container_index;
pub mod event;
pub mod intent;
pub mod link;
pub mod resource;
pub mod working_set;

// Re-exports
pub use container_index::{ContainerIndex, ContainerMembers, RebuildSummary};
pub use event::{EventLog, TransferEvent};
pub use intent::TransferIntent;
pub use link::{ContainerId, ContainerResourceLink};
pub use resource::{QuantityHandle, ResourceQuantity, ResourceTank};
pub use working_set::{ResourceWorkingSet, Upsert};
