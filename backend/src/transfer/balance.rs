//! Balance engine
//!
//! Moves every participant's fill fraction toward the participants'
//! capacity-weighted average fill:
//!
//! ```text
//! target = Σamount / Σcapacity
//! ```
//!
//! # Algorithm
//!
//! 1. Snapshot `percent_full` for each participant
//! 2. **Give**: each participant below target receives
//!    `min(budget, capacity × target − amount)`; the sum is `left_to_move`
//! 3. **Take**: repeat until `left_to_move < ε`: each participant that was
//!    above target in the snapshot gives up
//!    `min(budget / n, amount − capacity × target, left_to_move)`
//!
//! All deficits are filled before any surplus is withdrawn, so the order of
//! participants only matters for how the take phase spreads its passes.
//! Participants are visited in container id order.
//!
//! Consecutive passes in which every over-filled participant gives its full
//! share are applied as one round, so a single full tank feeding hundreds of
//! empty ones needs a handful of rounds rather than thousands of passes.
//!
//! The take loop converges because total surplus equals total deficit, but
//! floating-point rounding or a misbehaving host quantity can leave it short.
//! It is capped at [`MAX_TAKE_ITERATIONS`] rounds and aborts with a
//! [`BalanceError`] if a round moves nothing. Before an error is returned the
//! uncovered part of the give phase is taken back from the receivers in
//! proportion to what each received, so an aborted pass never creates mass.

use crate::core::flow::FlowBudget;
use crate::models::link::ContainerResourceLink;
use crate::models::working_set::ResourceWorkingSet;
use thiserror::Error;

/// Take phase stops once less than this is left to move
pub const BALANCE_EPSILON: f64 = 1e-6;

/// Upper bound on take-phase rounds in one balance call
pub const MAX_TAKE_ITERATIONS: usize = 10_000;

/// Internal failures of the take phase
///
/// The uncovered part of the give phase has been rolled back when these
/// are returned.
#[derive(Debug, Error, PartialEq)]
pub enum BalanceError {
    #[error("Take phase stalled with {left_to_move} left to move")]
    TakePhaseStalled { left_to_move: f64 },

    #[error("Take phase exceeded {iterations} rounds with {left_to_move} left to move")]
    IterationCapExceeded { iterations: usize, left_to_move: f64 },
}

/// Result of one balance call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceOutcome {
    /// Size of the participant subset
    pub participants: usize,

    /// Capacity-weighted average fill, `None` when the pass was a no-op
    /// for lack of capacity
    pub target_fraction: Option<f64>,

    /// Added to under-filled participants
    pub given: f64,

    /// Removed from over-filled participants
    pub taken: f64,

    /// Take-phase passes run (a batched round counts every pass it covers)
    pub iterations: usize,
}

/// Balance an explicit participant subset
///
/// Zero-capacity participants count toward the budget split but never
/// give or receive. An empty subset or zero total capacity is a no-op.
///
/// # Example
///
/// ```rust
/// use fuel_balancer_core_rs::core::flow::FlowBudget;
/// use fuel_balancer_core_rs::transfer::balance;
/// use fuel_balancer_core_rs::{ContainerId, ContainerResourceLink, ResourceTank};
///
/// let a = ContainerResourceLink::new(ContainerId(1), ResourceTank::shared("Ore", 80.0, 100.0));
/// let b = ContainerResourceLink::new(ContainerId(2), ResourceTank::shared("Ore", 20.0, 100.0));
///
/// let outcome = balance(&[&a, &b], FlowBudget::from_amount(1000.0)).unwrap();
/// assert_eq!(outcome.target_fraction, Some(0.5));
/// assert_eq!(a.amount(), 50.0);
/// assert_eq!(b.amount(), 50.0);
/// ```
pub fn balance(
    participants: &[&ContainerResourceLink],
    budget: FlowBudget,
) -> Result<BalanceOutcome, BalanceError> {
    balance_within(participants, budget, MAX_TAKE_ITERATIONS)
}

fn balance_within(
    participants: &[&ContainerResourceLink],
    budget: FlowBudget,
    max_rounds: usize,
) -> Result<BalanceOutcome, BalanceError> {
    let mut outcome = BalanceOutcome {
        participants: participants.len(),
        ..Default::default()
    };

    let total_capacity: f64 = participants.iter().map(|l| l.capacity()).sum();
    if participants.is_empty() || total_capacity <= 0.0 {
        return Ok(outcome);
    }
    let total_amount: f64 = participants.iter().map(|l| l.amount()).sum();
    let target = total_amount / total_capacity;
    outcome.target_fraction = Some(target);

    let snapshot: Vec<(&ContainerResourceLink, f64)> = participants
        .iter()
        .filter_map(|link| link.percent_full().map(|pf| (*link, pf)))
        .collect();

    // Give to every participant below target
    let mut received: Vec<(&ContainerResourceLink, f64)> = Vec::new();
    let mut left_to_move = 0.0;
    for (link, percent_full) in &snapshot {
        if *percent_full < target {
            let deficit = link.capacity() * target - link.amount();
            let added = link.credit(budget.amount().min(deficit));
            if added > 0.0 {
                received.push((*link, added));
                left_to_move += added;
            }
        }
    }
    outcome.given = left_to_move;

    // Take from every participant above target until the given amount is covered
    let donors: Vec<&ContainerResourceLink> = snapshot
        .iter()
        .filter(|(_, percent_full)| *percent_full > target)
        .map(|(link, _)| *link)
        .collect();
    let per_link_cap = budget.share(participants.len());
    let mut rounds = 0;
    while left_to_move > BALANCE_EPSILON {
        if rounds >= max_rounds {
            roll_back(&received, outcome.given, left_to_move);
            return Err(BalanceError::IterationCapExceeded {
                iterations: rounds,
                left_to_move,
            });
        }
        rounds += 1;

        let surpluses: Vec<f64> = donors
            .iter()
            .map(|link| link.amount() - link.capacity() * target)
            .collect();
        let passes = full_passes(&surpluses, per_link_cap, left_to_move);

        let mut moved = 0.0;
        if passes > 0 {
            let take = passes as f64 * per_link_cap;
            for (link, surplus) in donors.iter().zip(&surpluses) {
                if *surplus > 0.0 {
                    moved += link.debit(take);
                }
            }
            outcome.iterations += passes;
        } else {
            let mut remaining = left_to_move;
            for (link, surplus) in donors.iter().zip(&surpluses) {
                let take = per_link_cap.min(*surplus).min(remaining);
                if take > 0.0 {
                    let removed = link.debit(take);
                    remaining -= removed;
                    moved += removed;
                }
            }
            outcome.iterations += 1;
        }
        left_to_move -= moved;
        outcome.taken += moved;

        if moved <= 0.0 && left_to_move > BALANCE_EPSILON {
            roll_back(&received, outcome.given, left_to_move);
            return Err(BalanceError::TakePhaseStalled { left_to_move });
        }
    }

    Ok(outcome)
}

/// Number of upcoming passes in which every donor with surplus gives its
/// full `per_link_cap` without running out of surplus or overshooting
/// `left_to_move`
fn full_passes(surpluses: &[f64], per_link_cap: f64, left_to_move: f64) -> usize {
    if !(per_link_cap > 0.0 && per_link_cap.is_finite()) {
        return 0;
    }
    let active: Vec<f64> = surpluses.iter().copied().filter(|s| *s > 0.0).collect();
    if active.is_empty() {
        return 0;
    }
    let min_surplus = active.iter().copied().fold(f64::INFINITY, f64::min);
    let by_surplus = (min_surplus / per_link_cap).floor();
    let by_left = (left_to_move / (active.len() as f64 * per_link_cap)).floor();
    by_surplus.min(by_left) as usize
}

/// Take `left_to_move` back from the receivers, pro rata to what each got
fn roll_back(received: &[(&ContainerResourceLink, f64)], given: f64, left_to_move: f64) {
    if given <= 0.0 {
        return;
    }
    let fraction = (left_to_move / given).min(1.0);
    for (link, added) in received {
        link.debit(added * fraction);
    }
}

/// Balance the working set's derived participant subset
///
/// Participants are `Balance` links plus `None` links when the set has
/// auto-balance on.
pub fn balance_working_set(
    set: &ResourceWorkingSet,
    budget: FlowBudget,
) -> Result<BalanceOutcome, BalanceError> {
    balance(&set.balance_participants(), budget)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::link::ContainerId;
    use crate::models::resource::ResourceTank;

    fn links(levels: &[(f64, f64)]) -> Vec<ContainerResourceLink> {
        levels
            .iter()
            .enumerate()
            .map(|(i, (amount, capacity))| {
                ContainerResourceLink::new(
                    ContainerId(i as u32),
                    ResourceTank::shared("LiquidFuel", *amount, *capacity),
                )
            })
            .collect()
    }

    fn amounts(links: &[ContainerResourceLink]) -> Vec<f64> {
        links.iter().map(|l| l.amount()).collect()
    }

    #[test]
    fn test_two_equal_tanks_meet_in_the_middle() {
        let links = links(&[(80.0, 100.0), (20.0, 100.0)]);
        let refs: Vec<&ContainerResourceLink> = links.iter().collect();

        let outcome = balance(&refs, FlowBudget::from_amount(1000.0)).unwrap();

        assert_eq!(amounts(&links), vec![50.0, 50.0]);
        assert_eq!(outcome.given, 30.0);
        assert_eq!(outcome.taken, 30.0);
        assert_eq!(outcome.iterations, 1);
    }

    #[test]
    fn test_capacity_weighted_target() {
        let links = links(&[(100.0, 100.0), (0.0, 50.0), (0.0, 50.0)]);
        let refs: Vec<&ContainerResourceLink> = links.iter().collect();

        let outcome = balance(&refs, FlowBudget::from_amount(1000.0)).unwrap();

        assert_eq!(outcome.target_fraction, Some(0.5));
        assert_eq!(amounts(&links), vec![50.0, 25.0, 25.0]);
    }

    #[test]
    fn test_budget_limits_give_and_take_loops() {
        // budget 4, three participants: give capped at 4, take at 4/3 per pass
        let links = links(&[(100.0, 100.0), (0.0, 100.0), (50.0, 100.0)]);
        let refs: Vec<&ContainerResourceLink> = links.iter().collect();

        let outcome = balance(&refs, FlowBudget::from_amount(4.0)).unwrap();

        assert_eq!(outcome.given, 4.0);
        assert!((outcome.taken - 4.0).abs() < 1e-9);
        assert_eq!(outcome.iterations, 3);
        let after = amounts(&links);
        assert!((after[0] - 96.0).abs() < 1e-9);
        assert_eq!(after[1], 4.0);
        assert_eq!(after[2], 50.0);
    }

    #[test]
    fn test_uniform_fill_is_idempotent() {
        let links = links(&[(25.0, 50.0), (50.0, 100.0), (10.0, 20.0)]);
        let refs: Vec<&ContainerResourceLink> = links.iter().collect();

        let outcome = balance(&refs, FlowBudget::from_amount(1000.0)).unwrap();

        assert_eq!(outcome.given, 0.0);
        assert_eq!(outcome.taken, 0.0);
        assert_eq!(amounts(&links), vec![25.0, 50.0, 10.0]);
    }

    #[test]
    fn test_degenerate_subsets_are_noops() {
        let outcome = balance(&[], FlowBudget::from_amount(10.0)).unwrap();
        assert_eq!(outcome, BalanceOutcome::default());

        let links = links(&[(0.0, 0.0), (0.0, 0.0)]);
        let refs: Vec<&ContainerResourceLink> = links.iter().collect();
        let outcome = balance(&refs, FlowBudget::from_amount(10.0)).unwrap();
        assert_eq!(outcome.participants, 2);
        assert_eq!(outcome.target_fraction, None);
        assert_eq!(amounts(&links), vec![0.0, 0.0]);
    }

    #[test]
    fn test_zero_capacity_participant_is_skipped() {
        let links = links(&[(0.0, 0.0), (60.0, 100.0), (20.0, 100.0)]);
        let refs: Vec<&ContainerResourceLink> = links.iter().collect();

        balance(&refs, FlowBudget::from_amount(1000.0)).unwrap();

        assert_eq!(amounts(&links), vec![0.0, 40.0, 40.0]);
    }

    #[test]
    fn test_balance_working_set_uses_derived_subset() {
        use crate::models::intent::TransferIntent;

        let mut set = ResourceWorkingSet::new("LiquidFuel");
        for (id, amount, intent) in [
            (1, 80.0, TransferIntent::Balance),
            (2, 20.0, TransferIntent::None),
            (3, 0.0, TransferIntent::Out),
        ] {
            let mut link = ContainerResourceLink::new(
                ContainerId(id),
                ResourceTank::shared("LiquidFuel", amount, 100.0),
            );
            link.set_intent(intent);
            set.insert(link);
        }

        let outcome = balance_working_set(&set, FlowBudget::from_amount(1000.0)).unwrap();
        assert_eq!(outcome.participants, 1);
        assert_eq!(set.link(ContainerId(1)).unwrap().amount(), 80.0);

        set.set_auto_balance(true);
        let outcome = balance_working_set(&set, FlowBudget::from_amount(1000.0)).unwrap();
        assert_eq!(outcome.participants, 2);
        assert_eq!(set.link(ContainerId(1)).unwrap().amount(), 50.0);
        assert_eq!(set.link(ContainerId(2)).unwrap().amount(), 50.0);
        assert_eq!(set.link(ContainerId(3)).unwrap().amount(), 0.0);
    }

    /// Host quantity that empties itself whenever the core lowers it
    struct DrainingTank {
        amount: std::cell::Cell<f64>,
        capacity: f64,
    }

    impl crate::models::resource::ResourceQuantity for DrainingTank {
        fn resource_name(&self) -> &str {
            "LiquidFuel"
        }

        fn amount(&self) -> f64 {
            self.amount.get()
        }

        fn capacity(&self) -> f64 {
            self.capacity
        }

        fn set_amount(&self, amount: f64) {
            let next = if amount < self.amount.get() { 0.0 } else { amount };
            self.amount.set(next);
        }
    }

    #[test]
    fn test_one_full_tank_feeds_many_empty_ones() {
        let mut levels = vec![(1e6, 1e6)];
        levels.extend(std::iter::repeat((0.0, 1e6)).take(120));
        let links = links(&levels);
        let refs: Vec<&ContainerResourceLink> = links.iter().collect();
        let before: f64 = amounts(&links).iter().sum();

        let outcome = balance(&refs, FlowBudget::from_amount(10.0)).unwrap();

        let after: f64 = amounts(&links).iter().sum();
        assert!((after - before).abs() < 1e-6);
        assert_eq!(outcome.given, 1200.0);
        assert!((outcome.taken - 1200.0).abs() < 1e-6);
        assert!(outcome.iterations > MAX_TAKE_ITERATIONS);
        assert!(links[1..].iter().all(|l| l.amount() == 10.0));
    }

    #[test]
    fn test_round_cap_rolls_back_give_phase() {
        let links = links(&[(80.0, 100.0), (20.0, 100.0)]);
        let refs: Vec<&ContainerResourceLink> = links.iter().collect();

        let err = balance_within(&refs, FlowBudget::from_amount(1000.0), 0).unwrap_err();

        assert_eq!(
            err,
            BalanceError::IterationCapExceeded {
                iterations: 0,
                left_to_move: 30.0,
            }
        );
        assert_eq!(amounts(&links), vec![80.0, 20.0]);
    }

    #[test]
    fn test_stalled_take_phase_rolls_back_remainder() {
        let draining = ContainerResourceLink::new(
            ContainerId(1),
            std::rc::Rc::new(DrainingTank {
                amount: std::cell::Cell::new(100.0),
                capacity: 100.0,
            }),
        );
        let normal = ContainerResourceLink::new(
            ContainerId(2),
            ResourceTank::shared("LiquidFuel", 100.0, 100.0),
        );
        let receiver = ContainerResourceLink::new(
            ContainerId(3),
            ResourceTank::shared("LiquidFuel", 0.0, 200.0),
        );

        // target 0.5: receiver gets 100, donors owe 50 each, shares of 100/3
        let err = balance(&[&draining, &normal, &receiver], FlowBudget::from_amount(100.0))
            .unwrap_err();

        let left_to_move = match err {
            BalanceError::TakePhaseStalled { left_to_move } => left_to_move,
            other => panic!("expected a stall, got {other:?}"),
        };
        assert!((left_to_move - 50.0 / 3.0).abs() < 1e-9);
        assert_eq!(draining.amount(), 0.0);
        assert!((normal.amount() - 50.0).abs() < 1e-9);
        // Receiver keeps only what the donors reported giving
        assert!((receiver.amount() - 250.0 / 3.0).abs() < 1e-9);
    }
}
