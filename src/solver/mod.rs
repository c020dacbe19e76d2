//! Propagate-and-backtrack search for a timetable.
//!
//! A solve ends in exactly one of three ways: a [`SolveOutcome::Feasible`] assignment, a proof
//! that none exists ([`SolveOutcome::Infeasible`]), or the termination condition firing first
//! ([`SolveOutcome::TimedOut`], carrying the largest partial assignment seen).

mod domain;
mod propagation;
mod search;
pub mod termination;

pub use search::Solver;

use crate::constraints::Placement;
use crate::model::{CourseIndex, Problem};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use termination::TimeBudget;

/// The `true` cells of a (possibly partial) grid, in slot, room, course order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Assignment {
    placements: Vec<Placement>,
}

impl Assignment {
    pub fn new(mut placements: Vec<Placement>) -> Self {
        placements.sort_unstable();
        Self { placements }
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn lectures_of(&self, course: CourseIndex) -> u32 {
        self.placements.iter().filter(|p| p.course == course).count() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Feasible(Assignment),
    Infeasible,
    TimedOut(Assignment),
}

impl SolveOutcome {
    pub fn status(&self) -> Status {
        match self {
            SolveOutcome::Feasible(_) => Status::Feasible,
            SolveOutcome::Infeasible => Status::Infeasible,
            SolveOutcome::TimedOut(_) => Status::TimedOut,
        }
    }

    /// The complete assignment of a feasible outcome, or the partial one of a timeout.
    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            SolveOutcome::Feasible(a) | SolveOutcome::TimedOut(a) => Some(a),
            SolveOutcome::Infeasible => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    Feasible,
    Infeasible,
    TimedOut,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Feasible => "feasible",
            Status::Infeasible => "infeasible",
            Status::TimedOut => "timed out",
        };
        f.write_str(name)
    }
}

/// Counters gathered during one solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveStatistics {
    /// Branching decisions, i.e. search nodes explored.
    pub decisions: u64,
    /// Decisions that had to be undone.
    pub failures: u64,
    /// Cells assigned by propagation.
    pub propagations: u64,
    pub peak_depth: usize,
    #[serde(rename = "elapsedMs", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64() * 1000.0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveResult {
    pub outcome: SolveOutcome,
    pub statistics: SolveStatistics,
}

/// Solves `problem` within a wall-clock `budget` starting now.
pub fn solve(problem: &Problem, budget: Duration) -> SolveResult {
    Solver::new(problem).solve(&mut TimeBudget::starting_now(budget))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_is_kept_in_slot_order() {
        let assignment = Assignment::new(vec![
            Placement { slot: 3, room: 0, course: 1 },
            Placement { slot: 1, room: 1, course: 0 },
            Placement { slot: 1, room: 0, course: 1 },
        ]);
        let slots: Vec<_> = assignment.placements().iter().map(|p| (p.slot, p.room)).collect();
        assert_eq!(slots, vec![(1, 0), (1, 1), (3, 0)]);
        assert_eq!(assignment.lectures_of(1), 2);
    }

    #[test]
    fn outcome_exposes_status_and_assignment() {
        assert_eq!(SolveOutcome::Infeasible.status(), Status::Infeasible);
        assert!(SolveOutcome::Infeasible.assignment().is_none());

        let partial = SolveOutcome::TimedOut(Assignment::default());
        assert_eq!(partial.status(), Status::TimedOut);
        assert_eq!(partial.assignment(), Some(&Assignment::default()));
        assert_eq!(serde_json::to_string(&Status::TimedOut).unwrap(), "\"timedOut\"");
    }
}
