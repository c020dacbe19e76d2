use super::domain::{CellState, CellStore};
use super::propagation::Propagator;
use super::termination::TerminationCondition;
use super::{Assignment, SolveOutcome, SolveResult, SolveStatistics};
use crate::constraints::{CellId, ConstraintSet, Placement};
use crate::model::{CourseIndex, Problem};
use log::{debug, info, trace};
use std::time::Instant;

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Search {
    Found,
    Exhausted,
    Stopped,
}

/// Depth-first propagate-and-backtrack search over the compiled cell grid.
///
/// Branching picks the course below quota with the fewest open cells (lowest index on ties)
/// and tries its open cells in slot, then room, order. A failed cell is refuted at the
/// current level before the next one is tried, so two lectures of the same course are never
/// explored in both orders.
#[derive(Debug)]
pub struct Solver<'a> {
    problem: &'a Problem,
    constraints: ConstraintSet,
    store: CellStore,
    propagator: Propagator,
    statistics: SolveStatistics,
    best_partial: Vec<Placement>,
    /// The current descent has passed a node fuller than `best_partial`.
    improved: bool,
}

impl<'a> Solver<'a> {
    pub fn new(problem: &'a Problem) -> Self {
        let constraints = ConstraintSet::compile(problem);
        let store = CellStore::new(&constraints, problem.course_count());
        Self {
            problem,
            constraints,
            store,
            propagator: Propagator::default(),
            statistics: SolveStatistics::default(),
            best_partial: Vec::new(),
            improved: false,
        }
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Searches for the first assignment meeting every constraint.
    ///
    /// Consumes the solver: a solve mutates the cell store down to whatever node it stopped at.
    pub fn solve<T: TerminationCondition>(mut self, termination: &mut T) -> SolveResult {
        let started = Instant::now();
        info!(
            "Starting search over {} cells for {} required lectures...",
            self.constraints.cell_count(),
            self.problem.required_lectures()
        );

        let search = match self.propagator.initialise(&self.constraints, &mut self.store) {
            Ok(()) => self.search(termination),
            Err(_) => {
                debug!("Quotas are contradictory before the first decision.");
                Search::Exhausted
            }
        };

        self.statistics.propagations = self.propagator.propagations();
        self.statistics.elapsed = started.elapsed();

        let outcome = match search {
            Search::Found => {
                SolveOutcome::Feasible(Assignment::new(self.store.placements(&self.constraints)))
            }
            Search::Exhausted => SolveOutcome::Infeasible,
            Search::Stopped => SolveOutcome::TimedOut(Assignment::new(self.best_partial)),
        };
        info!(
            "Search finished as {} in {:.2?} after {} decisions and {} failures.",
            outcome.status(),
            self.statistics.elapsed,
            self.statistics.decisions,
            self.statistics.failures
        );

        SolveResult {
            outcome,
            statistics: self.statistics,
        }
    }

    /// Explores the tree below the current, already propagated, node.
    ///
    /// Open decisions are kept on an explicit stack in step with the store's decision levels,
    /// so depth is bounded by memory rather than the thread's stack. On `Found` and `Stopped`
    /// the store is left at the node where search ended.
    fn search<T: TerminationCondition>(&mut self, termination: &mut T) -> Search {
        let mut decisions: Vec<CellId> = Vec::new();
        loop {
            if self.store.scheduled() > self.best_partial.len() {
                self.improved = true;
            }

            let Some(course) = self.select_course() else {
                return Search::Found;
            };
            if termination.should_stop() {
                self.record_partial();
                return Search::Stopped;
            }

            // propagation keeps open + true >= quota, so a course below quota has open cells
            if let Some(cell) = self.first_open_cell(course) {
                let depth = self.store.decision_level() + 1;
                self.statistics.decisions += 1;
                self.statistics.peak_depth = self.statistics.peak_depth.max(depth);
                termination.on_decision();
                trace!(
                    "Depth {}: placing {} at {:?}.",
                    depth,
                    self.problem.course(course).name,
                    self.constraints.cell(cell)
                );

                self.store.push_level();
                decisions.push(cell);
                if self.store.assign(cell, true).is_ok()
                    && self
                        .propagator
                        .propagate(&self.constraints, &mut self.store)
                        .is_ok()
                {
                    continue;
                }
            } else {
                self.record_partial();
            }

            // undo decisions until one can be refuted consistently
            loop {
                let Some(cell) = decisions.pop() else {
                    return Search::Exhausted;
                };
                self.store.pop_level();
                self.propagator.synchronise(&self.store);
                self.record_partial();
                self.statistics.failures += 1;

                // the cell failed under this node, so it is false here
                if self.store.assign(cell, false).is_ok()
                    && self
                        .propagator
                        .propagate(&self.constraints, &mut self.store)
                        .is_ok()
                {
                    break;
                }
            }
        }
    }

    /// Most-constrained course still below its quota.
    fn select_course(&self) -> Option<CourseIndex> {
        (0..self.problem.course_count())
            .filter(|&c| self.store.true_count(c) < self.constraints.quota(c))
            .min_by_key(|&c| (self.store.open_count(c), c))
    }

    fn first_open_cell(&self, course: CourseIndex) -> Option<CellId> {
        self.constraints
            .course_cells(course)
            .find(|&cell| self.store.state(cell) == CellState::Open)
    }

    /// Snapshots the current node if it was marked as the fullest seen so far. Only called
    /// while the store sits at a consistent node.
    fn record_partial(&mut self) {
        if self.improved {
            self.best_partial = self.store.placements(&self.constraints);
            self.improved = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Status;
    use crate::solver::termination::{DecisionBudget, Indefinite};

    #[test]
    fn places_lowest_slot_and_room_first() {
        let problem = Problem::builder(1, 3)
            .rooms(["R1", "R2"])
            .course("A", "Dr.X", 2)
            .build()
            .unwrap();
        let result = Solver::new(&problem).solve(&mut Indefinite);

        let SolveOutcome::Feasible(assignment) = &result.outcome else {
            panic!("expected a feasible timetable, got {:?}", result.outcome);
        };
        assert_eq!(
            assignment.placements(),
            &[
                Placement { slot: 0, room: 0, course: 0 },
                Placement { slot: 1, room: 0, course: 0 },
            ]
        );
    }

    #[test]
    fn most_constrained_course_is_placed_first() {
        // B can only use slot 2 and is placed by propagation, so A keeps slot 0
        let problem = Problem::builder(1, 3)
            .room("R1")
            .course("A", "Dr.X", 1)
            .course("B", "Dr.Y", 1)
            .unavailable("Dr.Y", [0, 1])
            .build()
            .unwrap();
        let result = Solver::new(&problem).solve(&mut Indefinite);
        let assignment = result.outcome.assignment().unwrap();

        assert!(assignment.placements().contains(&Placement { slot: 0, room: 0, course: 0 }));
        assert!(assignment.placements().contains(&Placement { slot: 2, room: 0, course: 1 }));
        // B was forced by propagation, so one decision suffices
        assert_eq!(result.statistics.decisions, 1);
    }

    #[test]
    fn backtracks_out_of_a_bad_first_choice() {
        // A at slot 0 leaves B and C fighting over slot 2, so A must move to slot 1
        let problem = Problem::builder(1, 3)
            .room("R1")
            .course("A", "Dr.X", 1)
            .course("B", "Dr.Y", 1)
            .course("C", "Dr.Z", 1)
            .unavailable("Dr.X", [2])
            .unavailable("Dr.Y", [1])
            .unavailable("Dr.Z", [1])
            .build()
            .unwrap();
        let result = Solver::new(&problem).solve(&mut Indefinite);
        let assignment = result.outcome.assignment().unwrap();

        assert_eq!(
            assignment.placements(),
            &[
                Placement { slot: 0, room: 0, course: 1 },
                Placement { slot: 1, room: 0, course: 0 },
                Placement { slot: 2, room: 0, course: 2 },
            ]
        );
        assert_eq!(result.statistics.failures, 1);
        assert_eq!(result.statistics.decisions, 2);
    }

    #[test]
    fn exhausted_search_is_infeasible() {
        let problem = Problem::builder(1, 2)
            .room("R1")
            .course("A", "Dr.X", 1)
            .course("B", "Dr.Y", 1)
            .course("C", "Dr.Z", 1)
            .build()
            .unwrap();
        let result = Solver::new(&problem).solve(&mut Indefinite);
        assert_eq!(result.outcome, SolveOutcome::Infeasible);
        assert!(result.statistics.failures > 0);
    }

    #[test]
    fn stopping_early_reports_best_partial() {
        let problem = Problem::builder(5, 8)
            .rooms(["R1", "R2", "R3"])
            .course("AI", "Dr.A", 2)
            .course("ML", "Dr.B", 2)
            .build()
            .unwrap();
        let result = Solver::new(&problem).solve(&mut DecisionBudget::new(1));

        let SolveOutcome::TimedOut(partial) = &result.outcome else {
            panic!("expected a timeout, got {:?}", result.outcome);
        };
        assert_eq!(result.statistics.decisions, 1);
        assert_eq!(partial.len(), 1);
    }

    #[test]
    fn zero_quotas_are_trivially_feasible() {
        let problem = Problem::builder(1, 1)
            .room("R1")
            .course("A", "Dr.X", 0)
            .build()
            .unwrap();
        let result = Solver::new(&problem).solve(&mut Indefinite);
        assert_eq!(result.outcome, SolveOutcome::Feasible(Assignment::default()));
        assert_eq!(result.statistics.decisions, 0);
    }

    #[test]
    fn deep_search_fits_a_small_stack() {
        // one decision per lecture, ten thousand levels deep
        let problem = Problem::builder(1, 20_000)
            .rooms(["R1", "R2"])
            .course("A", "Dr.A", 10_000)
            .build()
            .unwrap();

        let result = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || Solver::new(&problem).solve(&mut Indefinite))
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(result.outcome.status(), Status::Feasible);
        assert_eq!(result.outcome.assignment().unwrap().len(), 10_000);
        assert_eq!(result.statistics.peak_depth, 10_000);
        assert_eq!(result.statistics.failures, 0);
    }
}
