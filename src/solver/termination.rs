//! Conditions polled by the search before every decision. They are the only way to cut a solve
//! short; when one fires the search reports [`SolveOutcome::TimedOut`](super::SolveOutcome).

use std::time::{Duration, Instant};

/// Budget consulted by the search between decisions.
///
/// The search polls [`should_stop`](Self::should_stop) once per branching step, before it
/// picks the next cell, and reports each cell it then commits to through
/// [`on_decision`](Self::on_decision). Propagation and backtracking run between two polls and
/// are never interrupted, so a budget is honoured to within one decision's worth of work.
pub trait TerminationCondition {
    fn should_stop(&mut self) -> bool;

    fn on_decision(&mut self) {}
}

/// Triggers once a wall-clock deadline has passed.
#[derive(Clone, Copy, Debug)]
pub struct TimeBudget {
    /// `None` when the deadline lies beyond what [`Instant`] can represent.
    deadline: Option<Instant>,
}

impl TimeBudget {
    /// Give the search a time budget, starting now.
    pub fn starting_now(budget: Duration) -> TimeBudget {
        TimeBudget {
            deadline: Instant::now().checked_add(budget),
        }
    }

    pub fn until(deadline: Instant) -> TimeBudget {
        TimeBudget {
            deadline: Some(deadline),
        }
    }
}

impl TerminationCondition for TimeBudget {
    fn should_stop(&mut self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Stops after a fixed number of placements have been tried, so partial results are
/// reproducible regardless of machine speed.
#[derive(Debug, Copy, Clone)]
pub struct DecisionBudget {
    remaining: u64,
}

impl DecisionBudget {
    pub fn new(decisions: u64) -> Self {
        Self {
            remaining: decisions,
        }
    }
}

impl TerminationCondition for DecisionBudget {
    fn should_stop(&mut self) -> bool {
        self.remaining == 0
    }

    fn on_decision(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

/// Runs the search to completion.
#[derive(Debug, Copy, Clone, Default)]
pub struct Indefinite;

impl TerminationCondition for Indefinite {
    fn should_stop(&mut self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_budget_counts_decisions() {
        let mut budget = DecisionBudget::new(2);
        assert!(!budget.should_stop());
        budget.on_decision();
        assert!(!budget.should_stop());
        budget.on_decision();
        assert!(budget.should_stop());
        budget.on_decision();
        assert!(budget.should_stop());
    }

    #[test]
    fn expired_deadline_stops() {
        let mut budget = TimeBudget::until(Instant::now());
        assert!(budget.should_stop());

        let mut generous = TimeBudget::starting_now(Duration::from_secs(3600));
        assert!(!generous.should_stop());

        let mut unbounded = TimeBudget::starting_now(Duration::MAX);
        assert!(!unbounded.should_stop());
    }

    #[test]
    fn indefinite_never_stops() {
        let mut forever = Indefinite;
        for _ in 0..1000 {
            forever.on_decision();
        }
        assert!(!forever.should_stop());
        assert!(DecisionBudget::new(0).should_stop());
    }
}
