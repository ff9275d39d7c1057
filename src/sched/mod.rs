// src/sched/mod.rs

//! Scheduling of compiled check trees.
//!
//! - [`runner`] walks the tree, running groups in parallel or in order.
//! - [`reformat`] implements the check/format/restage workflow.
//! - [`restage`] holds the repository and operator side effects of that
//!   workflow behind the [`Restager`] trait.

pub mod reformat;
pub mod restage;
pub mod runner;

pub use reformat::{ReformatPlan, partition, reformat};
pub use restage::{GitRestager, Restager};
pub use runner::{CheckStream, RunContext, RunOptions, run_check};
