//! Core primitives shared by the engines: step clock and flow budget.

pub mod flow;
pub mod time;
