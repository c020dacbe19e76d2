use super::domain::{CellState, CellStore, Conflict};
use crate::constraints::{CellId, ConstraintSet};
use crate::model::CourseIndex;

/// Runs the constraint set to a fixed point over the trail.
///
/// Every trail entry past `head` is an assignment whose consequences have not been drawn yet.
/// Processing an entry can only assign open cells, so each pass shrinks the open set and the
/// loop terminates.
#[derive(Debug, Clone, Default)]
pub(crate) struct Propagator {
    head: usize,
    propagations: u64,
}

impl Propagator {
    /// Total number of cells assigned by propagation rather than by decisions.
    pub(crate) fn propagations(&self) -> u64 {
        self.propagations
    }

    /// Call after the store has been backtracked so stale trail positions are forgotten.
    pub(crate) fn synchronise(&mut self, store: &CellStore) {
        self.head = self.head.min(store.trail_len());
    }

    /// Checks every quota before search starts. A course with fewer possible cells than its
    /// quota fails here; one with exactly enough has them all forced.
    pub(crate) fn initialise(
        &mut self,
        constraints: &ConstraintSet,
        store: &mut CellStore,
    ) -> Result<(), Conflict> {
        for quota in constraints.quotas() {
            self.enforce_quota(quota.course, constraints, store)?;
        }
        self.propagate(constraints, store)
    }

    pub(crate) fn propagate(
        &mut self,
        constraints: &ConstraintSet,
        store: &mut CellStore,
    ) -> Result<(), Conflict> {
        while self.head < store.trail_len() {
            let cell = store.trail_entry(self.head);
            self.head += 1;

            if store.state(cell) == CellState::True {
                self.clear_groups(cell, constraints, store)?;
            }
            self.enforce_quota(store.course_of(cell), constraints, store)?;
        }
        Ok(())
    }

    /// A true cell rules out every other member of its at-most-one groups.
    fn clear_groups(
        &mut self,
        cell: CellId,
        constraints: &ConstraintSet,
        store: &mut CellStore,
    ) -> Result<(), Conflict> {
        for &group in constraints.watches(cell) {
            for &other in &constraints.groups()[group].cells {
                if other == cell {
                    continue;
                }
                if store.assign(other, false)? {
                    self.propagations += 1;
                }
            }
        }
        Ok(())
    }

    fn enforce_quota(
        &mut self,
        course: CourseIndex,
        constraints: &ConstraintSet,
        store: &mut CellStore,
    ) -> Result<(), Conflict> {
        let min = constraints.quota(course);
        let scheduled = store.true_count(course);
        let open = store.open_count(course);

        if scheduled + open < min {
            return Err(Conflict);
        }
        if scheduled < min && scheduled + open == min {
            for cell in constraints.course_cells(course) {
                if store.state(cell) == CellState::Open {
                    store.assign(cell, true)?;
                    self.propagations += 1;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Problem;

    fn setup(problem: &Problem) -> (ConstraintSet, CellStore, Propagator) {
        let constraints = ConstraintSet::compile(problem);
        let store = CellStore::new(&constraints, problem.course_count());
        (constraints, store, Propagator::default())
    }

    #[test]
    fn true_cell_clears_room_slot_and_faculty() {
        // A and B share Dr.X, C conflicts with A
        let problem = Problem::builder(1, 2)
            .rooms(["R1", "R2"])
            .course("A", "Dr.X", 1)
            .course("B", "Dr.X", 1)
            .course("C", "Dr.Y", 1)
            .conflict("A", "C")
            .build()
            .unwrap();
        let (constraints, mut store, mut propagator) = setup(&problem);
        propagator.initialise(&constraints, &mut store).unwrap();

        // A at slot 0, room 0
        let a0 = constraints.course_cells(0).start;
        store.assign(a0, true).unwrap();
        propagator.propagate(&constraints, &mut store).unwrap();

        for c in 1..3 {
            for cell in constraints.course_cells(c) {
                if constraints.cell(cell).slot == 0 {
                    assert_eq!(store.state(cell), CellState::False, "{:?}", constraints.cell(cell));
                }
            }
        }
        // A's other room at slot 0 is gone too
        assert_eq!(store.state(a0 + 1), CellState::False);
        // B and C are each down to their two slot-1 cells
        assert_eq!(store.open_count(1), 2);
        assert_eq!(store.open_count(2), 2);
        assert!(propagator.propagations() > 0);
    }

    #[test]
    fn tight_quota_forces_remaining_cells() {
        let problem = Problem::builder(1, 3)
            .room("R1")
            .course("A", "Dr.X", 2)
            .unavailable("Dr.X", [0])
            .build()
            .unwrap();
        let (constraints, mut store, mut propagator) = setup(&problem);
        propagator.initialise(&constraints, &mut store).unwrap();

        assert_eq!(store.true_count(0), 2);
        assert_eq!(store.open_count(0), 0);
    }

    #[test]
    fn pigeonhole_fails_at_root() {
        let problem = Problem::builder(1, 2)
            .room("R1")
            .course("A", "Dr.X", 2)
            .course("B", "Dr.Y", 1)
            .build()
            .unwrap();
        let (constraints, mut store, mut propagator) = setup(&problem);
        // A takes both slots, leaving nothing for B
        assert_eq!(propagator.initialise(&constraints, &mut store), Err(Conflict));
    }
}
