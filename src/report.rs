//! Solve summary: quota fulfilment per course and room utilization.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Scheduled | lectures placed for a course |
//! | Required | the course's minimum weekly lectures |
//! | Utilization | occupied (slot, room) pairs / (slot count x room count) |

use crate::model::Problem;
use crate::solver::{SolveResult, SolveStatistics, Status};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseReport {
    pub course: String,
    pub faculty: String,
    pub scheduled: u32,
    pub required: u32,
}

impl CourseReport {
    pub fn is_satisfied(&self) -> bool {
        self.scheduled >= self.required
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Utilization {
    pub occupied: usize,
    pub capacity: usize,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleReport {
    pub status: Status,
    pub courses: Vec<CourseReport>,
    pub utilization: Utilization,
    pub statistics: SolveStatistics,
}

impl ScheduleReport {
    /// Summarizes `result`. An infeasible result reports zero lectures for every course.
    pub fn calculate(problem: &Problem, result: &SolveResult) -> Self {
        let assignment = result.outcome.assignment();
        let courses = problem
            .courses()
            .iter()
            .enumerate()
            .map(|(index, course)| CourseReport {
                course: course.name.clone(),
                faculty: problem.faculty_of(index).name.clone(),
                scheduled: assignment.map_or(0, |a| a.lectures_of(index)),
                required: course.min_lectures,
            })
            .collect();

        let occupied = assignment.map_or(0, |a| a.len());
        let capacity = problem.capacity();
        let ratio = if capacity == 0 {
            0.0
        } else {
            occupied as f64 / capacity as f64
        };

        Self {
            status: result.outcome.status(),
            courses,
            utilization: Utilization {
                occupied,
                capacity,
                ratio,
            },
            statistics: result.statistics,
        }
    }

    /// Courses whose scheduled count falls short of their quota.
    pub fn unmet_quotas(&self) -> impl Iterator<Item = &CourseReport> {
        self.courses.iter().filter(|c| !c.is_satisfied())
    }

    pub fn all_quotas_met(&self) -> bool {
        self.unmet_quotas().next().is_none()
    }
}
