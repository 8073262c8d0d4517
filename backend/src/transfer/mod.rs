//! Transfer Module
//!
//! The two engines that move resource between the links of one working
//! set:
//! - **directed**: `TransferIn`, `TransferOut`, `DumpOut` for links with an
//!   explicit directional intent
//! - **balance**: equalization of fill fractions across balance participants
//!
//! # Critical Invariants
//!
//! 1. **Bounds**: every write keeps `0 ≤ amount ≤ capacity`
//! 2. **Conservation**: `TransferIn`/`TransferOut` move mass, never create or
//!    destroy it; `DumpOut` is the only sink
//! 3. **Flow ceiling**: a directed operation moves at most one flow budget
//!    per tick

pub mod balance;
pub mod directed;

// Re-export public API
pub use balance::{
    balance, balance_working_set, BalanceError, BalanceOutcome, BALANCE_EPSILON,
    MAX_TAKE_ITERATIONS,
};
pub use directed::{dump_out, execute_intent, transfer_in, transfer_out};
