//! Projects an [`Assignment`] onto the day/period grid.
//!
//! Days and periods are reported 1-based. The projection is a pure function of the problem
//! and the assignment, so decoding the same assignment always yields the same rows.

use crate::model::Problem;
use crate::solver::Assignment;
use log::warn;
use serde::Serialize;

/// One lecture as it appears in the timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lecture {
    pub course: String,
    pub faculty: String,
    pub room: String,
}

/// Everything running in one (day, period), in room order. Empty means free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodCell {
    pub day: u32,
    pub period: u32,
    pub lectures: Vec<Lecture>,
}

impl PeriodCell {
    pub fn is_free(&self) -> bool {
        self.lectures.is_empty()
    }
}

/// A flattened timetable row: one per lecture, or a marker for a period nothing runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TimetableRow {
    Lecture {
        day: u32,
        period: u32,
        course: String,
        faculty: String,
        room: String,
    },
    Free {
        day: u32,
        period: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub days: u32,
    pub slots_per_day: u32,
    /// Every (day, period) of the week, day-major.
    pub cells: Vec<PeriodCell>,
}

impl Timetable {
    /// Placements naming a slot, room or course the problem does not have are skipped with a
    /// warning; they can only come from an assignment built for another problem.
    pub fn decode(problem: &Problem, assignment: &Assignment) -> Self {
        let horizon = problem.horizon();
        let mut cells: Vec<PeriodCell> = horizon
            .slots()
            .map(|slot| PeriodCell {
                day: horizon.day(slot) + 1,
                period: horizon.period(slot) + 1,
                lectures: Vec::new(),
            })
            .collect();

        // placements are sorted by slot, then room
        for placement in assignment.placements() {
            let (Some(cell), Some(course), Some(room)) = (
                cells.get_mut(placement.slot as usize),
                problem.courses().get(placement.course),
                problem.rooms().get(placement.room),
            ) else {
                warn!("Skipping {:?}, which lies outside the problem.", placement);
                continue;
            };
            cell.lectures.push(Lecture {
                course: course.name.clone(),
                faculty: problem.faculty()[course.faculty].name.clone(),
                room: room.name.clone(),
            });
        }

        Self {
            days: horizon.days(),
            slots_per_day: horizon.slots_per_day(),
            cells,
        }
    }

    pub fn cell(&self, day: u32, period: u32) -> Option<&PeriodCell> {
        if day == 0 || period == 0 || day > self.days || period > self.slots_per_day {
            return None;
        }
        self.cells
            .get(((day - 1) * self.slots_per_day + (period - 1)) as usize)
    }

    pub fn lecture_count(&self) -> usize {
        self.cells.iter().map(|c| c.lectures.len()).sum()
    }

    pub fn free_cells(&self) -> impl Iterator<Item = &PeriodCell> {
        self.cells.iter().filter(|c| c.is_free())
    }

    /// The ordered row sequence: day, then period, then room.
    pub fn rows(&self) -> Vec<TimetableRow> {
        let mut rows = Vec::with_capacity(self.lecture_count() + self.cells.len());
        for cell in &self.cells {
            if cell.is_free() {
                rows.push(TimetableRow::Free {
                    day: cell.day,
                    period: cell.period,
                });
                continue;
            }
            rows.extend(cell.lectures.iter().map(|lecture| TimetableRow::Lecture {
                day: cell.day,
                period: cell.period,
                course: lecture.course.clone(),
                faculty: lecture.faculty.clone(),
                room: lecture.room.clone(),
            }));
        }
        rows
    }
}
