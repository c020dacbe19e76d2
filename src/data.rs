use crate::decode::{Timetable, TimetableRow};
use crate::error::ValidationError;
use crate::model::{Problem, Slot};
use crate::report::ScheduleReport;
use crate::solver::{SolveResult, Status};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Type aliases for clarity
pub type CourseName = String;
pub type FacultyName = String;
pub type RoomName = String;

/// The complete input for the scheduling problem, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingInput {
    pub courses: Vec<CourseName>,
    /// Which faculty member teaches each course.
    pub faculty: BTreeMap<CourseName, FacultyName>,
    pub rooms: Vec<RoomName>,
    pub days: u32,
    pub slots_per_day: u32,
    #[serde(default)]
    pub unavailability: BTreeMap<FacultyName, Vec<Slot>>,
    /// Courses sharing students; the two may never run in the same slot.
    #[serde(default)]
    pub conflict_pairs: Vec<(CourseName, CourseName)>,
    pub min_lectures: BTreeMap<CourseName, u32>,
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
}

impl SchedulingInput {
    /// Validates the input into a [`Problem`].
    pub fn build(&self) -> Result<Problem, ValidationError> {
        let mut builder = Problem::builder(self.days, self.slots_per_day).rooms(&self.rooms);
        for course in &self.courses {
            builder = builder.declare_course(course);
        }
        for (course, faculty) in &self.faculty {
            builder = builder.assign_faculty(course, faculty);
        }
        for (course, &min) in &self.min_lectures {
            builder = builder.require_lectures(course, min);
        }
        for (faculty, slots) in &self.unavailability {
            builder = builder.unavailable(faculty, slots.iter().copied());
        }
        for (first, second) in &self.conflict_pairs {
            builder = builder.conflict(first, second);
        }
        builder.build()
    }

    /// Five days of eight periods, three rooms and five courses, one lecture each.
    pub fn sample() -> Self {
        let courses = ["AI", "ML", "Math", "B.Ed_Psych", "ITEP"];
        let lecturers = ["Dr.A", "Dr.B", "Dr.C", "Dr.D", "Dr.E"];
        Self {
            courses: courses.iter().map(|c| c.to_string()).collect(),
            faculty: courses
                .iter()
                .zip(lecturers)
                .map(|(c, f)| (c.to_string(), f.to_string()))
                .collect(),
            rooms: vec!["R1".into(), "R2".into(), "R3".into()],
            days: 5,
            slots_per_day: 8,
            unavailability: BTreeMap::from([
                ("Dr.A".to_string(), (0..4).collect()),
                ("Dr.C".to_string(), vec![10, 11]),
            ]),
            conflict_pairs: vec![
                ("AI".into(), "ML".into()),
                ("Math".into(), "B.Ed_Psych".into()),
            ],
            min_lectures: courses.iter().map(|c| (c.to_string(), 1)).collect(),
            time_limit_ms: None,
        }
    }
}

/// The final output of the solver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingOutput {
    pub status: Status,
    /// Lectures and free periods in day, period, room order. Empty when infeasible.
    pub timetable: Vec<TimetableRow>,
    pub report: ScheduleReport,
}

impl SchedulingOutput {
    pub fn new(problem: &Problem, result: &SolveResult) -> Self {
        let timetable = result
            .outcome
            .assignment()
            .map(|a| Timetable::decode(problem, a).rows())
            .unwrap_or_default();
        Self {
            status: result.outcome.status(),
            timetable,
            report: ScheduleReport::calculate(problem, result),
        }
    }
}
