//! Directed transfer engine
//!
//! One-directional operations run for every link whose intent is `In`,
//! `Out` or `Dump`. Each is bounded by the tick's [`FlowBudget`]:
//!
//! ```text
//! TransferIn   available = min(budget, headroom(target))
//!              donors    = other links with amount > 0 and intent ∈ {None, Out, Dump}
//! TransferOut  available = min(budget, amount(source))
//!              receivers = other links with headroom > 0 and intent ∈ {None, In}
//! DumpOut      available = min(budget, amount(link)), no destination
//! ```
//!
//! `available` is split evenly across the counterparties and each share is
//! clamped by the counterparty's own amount or headroom, so a counterparty
//! that cannot cover its share leaves the rest unmoved this tick.

use crate::core::flow::FlowBudget;
use crate::models::intent::TransferIntent;
use crate::models::link::{ContainerId, ContainerResourceLink};
use crate::models::working_set::ResourceWorkingSet;
use tracing::trace;

/// Pull into `target` from every eligible donor
///
/// Returns the amount added to `target`. Zero when the target is absent,
/// full, or has no donors.
///
/// # Example
///
/// ```rust
/// use fuel_balancer_core_rs::core::flow::FlowBudget;
/// use fuel_balancer_core_rs::transfer::transfer_in;
/// use fuel_balancer_core_rs::{ContainerId, ContainerIndex, ContainerMembers, ResourceTank};
///
/// let mut index = ContainerIndex::new();
/// index.rebuild(&[
///     ContainerMembers::new(ContainerId(1), vec![ResourceTank::shared("Ore", 90.0, 100.0)]),
///     ContainerMembers::new(ContainerId(2), vec![ResourceTank::shared("Ore", 5.0, 10.0)]),
///     ContainerMembers::new(ContainerId(3), vec![ResourceTank::shared("Ore", 5.0, 10.0)]),
/// ]);
///
/// let set = index.working_set("Ore").unwrap();
/// let moved = transfer_in(set, ContainerId(1), FlowBudget::from_amount(100.0));
/// assert_eq!(moved, 10.0);
/// assert_eq!(set.link(ContainerId(1)).unwrap().amount(), 100.0);
/// ```
pub fn transfer_in(set: &ResourceWorkingSet, target: ContainerId, budget: FlowBudget) -> f64 {
    let link = match set.link(target) {
        Some(link) => link,
        None => return 0.0,
    };

    let donors: Vec<&ContainerResourceLink> = set
        .links()
        .iter()
        .filter(|d| d.container() != target && d.amount() > 0.0 && d.intent().can_donate())
        .collect();
    if donors.is_empty() {
        return 0.0;
    }

    let available = budget.amount().min(link.headroom());
    let per_donor = available / donors.len() as f64;

    let total_taken: f64 = donors.iter().map(|donor| donor.debit(per_donor)).sum();
    let added = link.credit(total_taken);

    trace!(
        resource = set.resource_name(),
        container = %target,
        donors = donors.len(),
        amount = added,
        "transfer in"
    );
    added
}

/// Push out of `source` to every eligible recipient
///
/// Returns the amount removed from `source`.
pub fn transfer_out(set: &ResourceWorkingSet, source: ContainerId, budget: FlowBudget) -> f64 {
    let link = match set.link(source) {
        Some(link) => link,
        None => return 0.0,
    };

    let recipients: Vec<&ContainerResourceLink> = set
        .links()
        .iter()
        .filter(|r| r.container() != source && r.headroom() > 0.0 && r.intent().can_receive())
        .collect();
    if recipients.is_empty() {
        return 0.0;
    }

    let available = budget.amount().min(link.amount());
    let per_recipient = available / recipients.len() as f64;

    let total_given: f64 = recipients
        .iter()
        .map(|recipient| recipient.credit(per_recipient))
        .sum();
    let removed = link.debit(total_given);

    trace!(
        resource = set.resource_name(),
        container = %source,
        recipients = recipients.len(),
        amount = removed,
        "transfer out"
    );
    removed
}

/// Jettison up to one budget from `link`
///
/// Returns the amount destroyed.
pub fn dump_out(set: &ResourceWorkingSet, link: ContainerId, budget: FlowBudget) -> f64 {
    let dumped = match set.link(link) {
        Some(l) => l.debit(budget.amount().min(l.amount())),
        None => return 0.0,
    };

    trace!(
        resource = set.resource_name(),
        container = %link,
        amount = dumped,
        "dump out"
    );
    dumped
}

/// Run the operation matching the link's current intent
///
/// `None` and `Balance` links are left to the balance engine and move
/// nothing here.
pub fn execute_intent(set: &ResourceWorkingSet, container: ContainerId, budget: FlowBudget) -> f64 {
    match set.link(container).map(|l| l.intent()) {
        Some(TransferIntent::In) => transfer_in(set, container, budget),
        Some(TransferIntent::Out) => transfer_out(set, container, budget),
        Some(TransferIntent::Dump) => dump_out(set, container, budget),
        _ => 0.0,
    }
}
