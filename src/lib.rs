//! Weekly course timetabling as a constraint satisfaction problem.
//!
//! Courses are assigned to (slot, room) pairs such that rooms, courses and faculty are never
//! double-booked, faculty unavailability is respected, courses sharing students never run
//! concurrently, and every course receives its minimum number of lectures.
//!
//! The pipeline is:
//! 1. [`SchedulingInput::build`] (or [`model::ProblemBuilder`]) validates input into a [`Problem`].
//! 2. [`constraints::ConstraintSet::compile`] turns the rules into constraints over the grid.
//! 3. [`solver::Solver`] runs propagate-and-backtrack search under a termination condition.
//! 4. [`decode::Timetable::decode`] projects the assignment onto the day/period grid.
//! 5. [`report::ScheduleReport::calculate`] summarizes quotas and utilization.

pub mod constraints;
pub mod data;
pub mod decode;
pub mod error;
pub mod model;
pub mod report;
pub mod solver;

pub use data::{SchedulingInput, SchedulingOutput};
pub use error::ValidationError;
pub use model::Problem;
pub use solver::{SolveOutcome, SolveResult, solve};
