use crate::constraints::{CellId, ConstraintSet, Placement};
use crate::model::CourseIndex;

/// The value of one grid cell during search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellState {
    Open,
    True,
    False,
}

/// A cell would have to be both true and false. Consumed by backtracking, never surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Conflict;

/// Tri-state store over the cell arena, with a trail so decisions can be undone.
///
/// Per-course counts of true and open cells are kept in step with every assignment.
#[derive(Debug, Clone)]
pub(crate) struct CellStore {
    states: Vec<CellState>,
    course_of: Vec<CourseIndex>,
    trail: Vec<CellId>,
    /// Trail length at the start of each decision level.
    levels: Vec<usize>,
    true_count: Vec<u32>,
    open_count: Vec<u32>,
}

impl CellStore {
    pub(crate) fn new(constraints: &ConstraintSet, course_count: usize) -> Self {
        let course_of: Vec<CourseIndex> = (0..constraints.cell_count())
            .map(|id| constraints.cell(id).course)
            .collect();
        let open_count = (0..course_count)
            .map(|c| constraints.course_cells(c).len() as u32)
            .collect();

        Self {
            states: vec![CellState::Open; course_of.len()],
            course_of,
            trail: Vec::new(),
            levels: Vec::new(),
            true_count: vec![0; course_count],
            open_count,
        }
    }

    pub(crate) fn state(&self, cell: CellId) -> CellState {
        self.states[cell]
    }

    pub(crate) fn course_of(&self, cell: CellId) -> CourseIndex {
        self.course_of[cell]
    }

    pub(crate) fn true_count(&self, course: CourseIndex) -> u32 {
        self.true_count[course]
    }

    pub(crate) fn open_count(&self, course: CourseIndex) -> u32 {
        self.open_count[course]
    }

    /// Number of cells currently set true across all courses.
    pub(crate) fn scheduled(&self) -> usize {
        self.true_count.iter().map(|&n| n as usize).sum()
    }

    pub(crate) fn trail_len(&self) -> usize {
        self.trail.len()
    }

    pub(crate) fn trail_entry(&self, position: usize) -> CellId {
        self.trail[position]
    }

    pub(crate) fn decision_level(&self) -> usize {
        self.levels.len()
    }

    /// Sets `cell` to `value`. Returns `Ok(true)` if the cell changed, `Ok(false)` if it
    /// already held `value`.
    pub(crate) fn assign(&mut self, cell: CellId, value: bool) -> Result<bool, Conflict> {
        let target = if value { CellState::True } else { CellState::False };
        match self.states[cell] {
            CellState::Open => {
                let course = self.course_of[cell];
                self.states[cell] = target;
                self.open_count[course] -= 1;
                if value {
                    self.true_count[course] += 1;
                }
                self.trail.push(cell);
                Ok(true)
            }
            current if current == target => Ok(false),
            _ => Err(Conflict),
        }
    }

    pub(crate) fn push_level(&mut self) {
        self.levels.push(self.trail.len());
    }

    /// Undoes every assignment made since the matching [`CellStore::push_level`].
    pub(crate) fn pop_level(&mut self) {
        let Some(mark) = self.levels.pop() else {
            return;
        };
        for cell in self.trail.drain(mark..) {
            let course = self.course_of[cell];
            if self.states[cell] == CellState::True {
                self.true_count[course] -= 1;
            }
            self.open_count[course] += 1;
            self.states[cell] = CellState::Open;
        }
    }

    /// The cells currently set true, as placements in (slot, room, course) order.
    pub(crate) fn placements(&self, constraints: &ConstraintSet) -> Vec<Placement> {
        let mut placements: Vec<Placement> = self
            .trail
            .iter()
            .filter(|&&cell| self.states[cell] == CellState::True)
            .map(|&cell| constraints.cell(cell))
            .collect();
        placements.sort_unstable();
        placements
    }
}
