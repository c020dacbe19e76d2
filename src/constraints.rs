//! Compiles the scheduling rules of a [`Problem`] into constraints over the boolean grid
//! `X[course][slot][room]`.
//!
//! The grid is stored sparsely: only cells that survive faculty unavailability are given an
//! id in the cell arena, so unavailability is applied once, at compile time. Every other
//! exclusivity rule becomes an at-most-one group over cell ids, and each course's quota a
//! lower bound on its own cells.

use crate::model::{CourseIndex, Problem, RoomIndex, Slot};
use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::ops::Range;

pub type CellId = usize;
pub type GroupId = usize;

/// One `true` cell of the grid: `course` is taught in `room` at `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub slot: Slot,
    pub room: RoomIndex,
    pub course: CourseIndex,
}

/// The scheduling rules, in the order they are compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    RoomExclusivity,
    SingleRoomPerSlot,
    FacultyExclusivity,
    FacultyUnavailability,
    ConflictPair,
    MinimumLectures,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rule::RoomExclusivity => "Room Exclusivity",
            Rule::SingleRoomPerSlot => "Single Room Per Slot",
            Rule::FacultyExclusivity => "Faculty Exclusivity",
            Rule::FacultyUnavailability => "Faculty Unavailability",
            Rule::ConflictPair => "Conflict Pair",
            Rule::MinimumLectures => "Minimum Lectures",
        };
        f.write_str(name)
    }
}

/// At most one of `cells` may be true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtMostOne {
    pub rule: Rule,
    pub cells: Vec<CellId>,
}

/// At least `min` cells of `course` must be true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub course: CourseIndex,
    pub min: u32,
}

/// The compiled constraint set of one problem instance.
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    cells: Vec<Placement>,
    course_cells: Vec<Range<CellId>>,
    groups: Vec<AtMostOne>,
    quotas: Vec<Quota>,
    watches: Vec<Vec<GroupId>>,
    excluded: usize,
}

impl ConstraintSet {
    pub fn compile(problem: &Problem) -> Self {
        let slot_count = problem.slot_count() as usize;
        let room_count = problem.room_count();
        info!(
            "Compiling constraints for {} courses, {} rooms and {} slots...",
            problem.course_count(),
            room_count,
            slot_count
        );

        // 4. cell arena, pre-filtered by faculty availability
        let mut cells = Vec::new();
        let mut course_cells = Vec::with_capacity(problem.course_count());
        // (course, slot) -> cells, dense
        let mut by_course_slot: Vec<Vec<CellId>> =
            vec![Vec::new(); problem.course_count() * slot_count];
        for course in 0..problem.course_count() {
            let start = cells.len();
            let faculty = problem.faculty_of(course);
            for slot in problem.horizon().slots() {
                if !faculty.is_available(slot) {
                    continue;
                }
                for room in 0..room_count {
                    by_course_slot[course * slot_count + slot as usize].push(cells.len());
                    cells.push(Placement { slot, room, course });
                }
            }
            course_cells.push(start..cells.len());
        }
        let excluded = problem.course_count() * problem.capacity() - cells.len();

        let mut groups = Vec::new();
        let mut emit = |rule: Rule, members: Vec<CellId>| {
            if members.len() >= 2 {
                groups.push(AtMostOne {
                    rule,
                    cells: members,
                });
            }
        };

        // 1. one course per (slot, room)
        let mut by_slot_room: Vec<Vec<CellId>> = vec![Vec::new(); slot_count * room_count];
        for (id, cell) in cells.iter().enumerate() {
            by_slot_room[cell.slot as usize * room_count + cell.room].push(id);
        }
        for members in by_slot_room {
            emit(Rule::RoomExclusivity, members);
        }

        // 2. one room per (course, slot)
        for members in &by_course_slot {
            emit(Rule::SingleRoomPerSlot, members.clone());
        }

        // 3. one lecture per (faculty, slot); a single-course faculty is already covered by 2.
        for faculty in problem.faculty() {
            if faculty.courses.len() < 2 {
                continue;
            }
            for slot in 0..slot_count {
                let members = faculty
                    .courses
                    .iter()
                    .flat_map(|&c| by_course_slot[c * slot_count + slot].iter().copied())
                    .collect();
                emit(Rule::FacultyExclusivity, members);
            }
        }

        // 5. conflicting courses never share a slot
        for (first, course) in problem.courses().iter().enumerate() {
            for &second in course.conflicts.iter().filter(|&&j| j > first) {
                for slot in 0..slot_count {
                    let members = by_course_slot[first * slot_count + slot]
                        .iter()
                        .chain(&by_course_slot[second * slot_count + slot])
                        .copied()
                        .collect();
                    emit(Rule::ConflictPair, members);
                }
            }
        }

        // 6. quotas
        let quotas = problem
            .courses()
            .iter()
            .enumerate()
            .map(|(course, c)| Quota {
                course,
                min: c.min_lectures,
            })
            .collect();

        let mut watches = vec![Vec::new(); cells.len()];
        for (group_id, group) in groups.iter().enumerate() {
            for &cell in &group.cells {
                watches[cell].push(group_id);
            }
        }

        debug!(
            "Compiled {} cells ({} excluded by unavailability) and {} at-most-one groups.",
            cells.len(),
            excluded,
            groups.len()
        );

        Self {
            cells,
            course_cells,
            groups,
            quotas,
            watches,
            excluded,
        }
    }

    pub fn cell(&self, id: CellId) -> Placement {
        self.cells[id]
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cell ids of `course`, ordered by slot, then room.
    pub fn course_cells(&self, course: CourseIndex) -> Range<CellId> {
        self.course_cells[course].clone()
    }

    pub fn groups(&self) -> &[AtMostOne] {
        &self.groups
    }

    /// Groups containing `cell`.
    pub fn watches(&self, cell: CellId) -> &[GroupId] {
        &self.watches[cell]
    }

    pub fn quotas(&self) -> &[Quota] {
        &self.quotas
    }

    pub fn quota(&self, course: CourseIndex) -> u32 {
        self.quotas[course].min
    }

    /// Grid cells removed up front because the course's faculty is unavailable.
    pub fn excluded_cells(&self) -> usize {
        self.excluded
    }

    pub fn group_count(&self, rule: Rule) -> usize {
        self.groups.iter().filter(|g| g.rule == rule).count()
    }
}

/// A rule broken by a concrete set of placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub rule: Rule,
    pub description: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.description)
    }
}

/// Checks `placements` against every rule straight from the problem definition.
///
/// This does not use the compiled groups, so it doubles as an independent check of the engine.
/// Quotas are only checked when `check_quotas` is set, since partial assignments miss them
/// by construction.
pub fn violations(problem: &Problem, placements: &[Placement], check_quotas: bool) -> Vec<Violation> {
    let mut found = Vec::new();
    let name = |c: CourseIndex| problem.course(c).name.as_str();

    for (i, a) in placements.iter().enumerate() {
        let a_faculty = problem.course(a.course).faculty;
        if !problem.faculty_of(a.course).is_available(a.slot) {
            found.push(Violation {
                rule: Rule::FacultyUnavailability,
                description: format!(
                    "{} is scheduled at slot {} while {} is unavailable",
                    name(a.course),
                    a.slot,
                    problem.faculty_of(a.course).name
                ),
            });
        }
        for b in placements[i + 1..].iter().filter(|b| b.slot == a.slot) {
            if a.room == b.room {
                found.push(Violation {
                    rule: Rule::RoomExclusivity,
                    description: format!(
                        "{} and {} share room {} at slot {}",
                        name(a.course),
                        name(b.course),
                        problem.rooms()[a.room].name,
                        a.slot
                    ),
                });
            }
            if a.course == b.course {
                found.push(Violation {
                    rule: Rule::SingleRoomPerSlot,
                    description: format!("{} occupies two rooms at slot {}", name(a.course), a.slot),
                });
            } else if a_faculty == problem.course(b.course).faculty {
                found.push(Violation {
                    rule: Rule::FacultyExclusivity,
                    description: format!(
                        "{} teaches {} and {} at slot {}",
                        problem.faculty_of(a.course).name,
                        name(a.course),
                        name(b.course),
                        a.slot
                    ),
                });
            }
            if problem.course(a.course).conflicts.contains(&b.course) {
                found.push(Violation {
                    rule: Rule::ConflictPair,
                    description: format!(
                        "{} and {} share students but both run at slot {}",
                        name(a.course),
                        name(b.course),
                        a.slot
                    ),
                });
            }
        }
    }

    if check_quotas {
        for (course, c) in problem.courses().iter().enumerate() {
            let scheduled = placements.iter().filter(|p| p.course == course).count() as u32;
            if scheduled < c.min_lectures {
                found.push(Violation {
                    rule: Rule::MinimumLectures,
                    description: format!(
                        "{} has {} lectures, {} required",
                        c.name, scheduled, c.min_lectures
                    ),
                });
            }
        }
    }

    found
}
