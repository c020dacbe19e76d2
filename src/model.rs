//! Domain model: courses, faculty, rooms and the slot index space they are scheduled over.
//!
//! Everything here is immutable once [`ProblemBuilder::build`] succeeds. The only mutable
//! state of a solve lives in the search engine's cell store.

use crate::error::ValidationError;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Range;

// Type aliases for clarity
pub type CourseIndex = usize;
pub type FacultyIndex = usize;
pub type RoomIndex = usize;
pub type Slot = u32;

/// Upper bound on `courses x slots x rooms`, the size of the compiled cell grid.
pub const MAX_CELLS: u64 = 1_000_000;

/// The weekly grid of uniform periods. Slot `s` lies on day `s / slots_per_day`,
/// period `s % slots_per_day` (both 0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    days: u32,
    slots_per_day: u32,
}

impl Horizon {
    pub fn new(days: u32, slots_per_day: u32) -> Result<Self, ValidationError> {
        if days == 0 || slots_per_day == 0 {
            return Err(ValidationError::EmptyHorizon {
                days,
                slots_per_day,
            });
        }
        if days.checked_mul(slots_per_day).is_none() {
            return Err(ValidationError::HorizonTooLarge {
                days,
                slots_per_day,
            });
        }
        Ok(Self {
            days,
            slots_per_day,
        })
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn slots_per_day(&self) -> u32 {
        self.slots_per_day
    }

    pub fn slot_count(&self) -> u32 {
        self.days * self.slots_per_day
    }

    pub fn slots(&self) -> Range<Slot> {
        0..self.slot_count()
    }

    pub fn day(&self, slot: Slot) -> u32 {
        slot / self.slots_per_day
    }

    pub fn period(&self, slot: Slot) -> u32 {
        slot % self.slots_per_day
    }
}

/// A course to be scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub name: String,
    pub faculty: FacultyIndex,
    pub min_lectures: u32,
    /// Courses sharing students with this one, sorted and without duplicates.
    pub conflicts: Vec<CourseIndex>,
}

/// A member of faculty together with the courses they teach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Faculty {
    pub name: String,
    pub courses: Vec<CourseIndex>,
    pub unavailable: BTreeSet<Slot>,
}

impl Faculty {
    pub fn is_available(&self, slot: Slot) -> bool {
        !self.unavailable.contains(&slot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub name: String,
}

/// A validated timetabling instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    courses: Vec<Course>,
    faculty: Vec<Faculty>,
    rooms: Vec<Room>,
    horizon: Horizon,
}

impl Problem {
    pub fn builder(days: u32, slots_per_day: u32) -> ProblemBuilder {
        ProblemBuilder::new(days, slots_per_day)
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course(&self, index: CourseIndex) -> &Course {
        &self.courses[index]
    }

    pub fn course_index(&self, name: &str) -> Option<CourseIndex> {
        self.courses.iter().position(|c| c.name == name)
    }

    pub fn faculty(&self) -> &[Faculty] {
        &self.faculty
    }

    /// The faculty member teaching `course`.
    pub fn faculty_of(&self, course: CourseIndex) -> &Faculty {
        &self.faculty[self.courses[course].faculty]
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn slot_count(&self) -> u32 {
        self.horizon.slot_count()
    }

    /// Number of (slot, room) pairs in the week.
    pub fn capacity(&self) -> usize {
        self.slot_count() as usize * self.room_count()
    }

    /// Total number of lectures the quotas ask for.
    pub fn required_lectures(&self) -> u32 {
        self.courses.iter().map(|c| c.min_lectures).sum()
    }
}

/// Collects raw, name-based input and validates it into a [`Problem`].
#[derive(Debug, Clone, Default)]
pub struct ProblemBuilder {
    days: u32,
    slots_per_day: u32,
    courses: Vec<String>,
    rooms: Vec<String>,
    faculty: BTreeMap<String, String>,
    quotas: BTreeMap<String, u32>,
    unavailability: BTreeMap<String, BTreeSet<Slot>>,
    conflicts: Vec<(String, String)>,
}

impl ProblemBuilder {
    pub fn new(days: u32, slots_per_day: u32) -> Self {
        Self {
            days,
            slots_per_day,
            ..Self::default()
        }
    }

    /// Declares a course with its faculty and quota in one go.
    pub fn course(self, name: &str, faculty: &str, min_lectures: u32) -> Self {
        self.declare_course(name)
            .assign_faculty(name, faculty)
            .require_lectures(name, min_lectures)
    }

    pub fn declare_course(mut self, name: &str) -> Self {
        self.courses.push(name.to_string());
        self
    }

    pub fn assign_faculty(mut self, course: &str, faculty: &str) -> Self {
        self.faculty.insert(course.to_string(), faculty.to_string());
        self
    }

    pub fn require_lectures(mut self, course: &str, min_lectures: u32) -> Self {
        self.quotas.insert(course.to_string(), min_lectures);
        self
    }

    pub fn room(mut self, name: &str) -> Self {
        self.rooms.push(name.to_string());
        self
    }

    pub fn rooms<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rooms.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn unavailable<I>(mut self, faculty: &str, slots: I) -> Self
    where
        I: IntoIterator<Item = Slot>,
    {
        self.unavailability
            .entry(faculty.to_string())
            .or_default()
            .extend(slots);
        self
    }

    pub fn conflict(mut self, first: &str, second: &str) -> Self {
        self.conflicts.push((first.to_string(), second.to_string()));
        self
    }

    pub fn build(self) -> Result<Problem, ValidationError> {
        let horizon = Horizon::new(self.days, self.slots_per_day)?;
        let slot_count = horizon.slot_count();

        // empty course or room lists still allocate one timetable cell per slot
        let cells = (self.courses.len().max(1) as u64)
            .saturating_mul(u64::from(slot_count))
            .saturating_mul(self.rooms.len().max(1) as u64);
        if cells > MAX_CELLS {
            return Err(ValidationError::TooManyCells {
                cells,
                limit: MAX_CELLS,
            });
        }

        if let Some(name) = self.courses.iter().duplicates().next() {
            return Err(ValidationError::DuplicateCourse(name.clone()));
        }
        if let Some(name) = self.rooms.iter().duplicates().next() {
            return Err(ValidationError::DuplicateRoom(name.clone()));
        }

        let course_lookup: HashMap<&str, CourseIndex> = self
            .courses
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        if let Some(course) = self
            .faculty
            .keys()
            .find(|c| !course_lookup.contains_key(c.as_str()))
        {
            return Err(ValidationError::UnknownCourse {
                context: "faculty map",
                course: course.clone(),
            });
        }
        if let Some(course) = self
            .quotas
            .keys()
            .find(|c| !course_lookup.contains_key(c.as_str()))
        {
            return Err(ValidationError::UnknownCourse {
                context: "minimum lecture map",
                course: course.clone(),
            });
        }

        // faculty are indexed in order of their first course
        let mut faculty: Vec<Faculty> = Vec::new();
        let mut faculty_lookup: HashMap<&str, FacultyIndex> = HashMap::new();
        let mut courses = Vec::with_capacity(self.courses.len());
        for (index, name) in self.courses.iter().enumerate() {
            let faculty_name = self
                .faculty
                .get(name)
                .ok_or_else(|| ValidationError::MissingFaculty(name.clone()))?;
            let min_lectures = *self
                .quotas
                .get(name)
                .ok_or_else(|| ValidationError::MissingQuota(name.clone()))?;
            let faculty_index = *faculty_lookup
                .entry(faculty_name.as_str())
                .or_insert_with(|| {
                    faculty.push(Faculty {
                        name: faculty_name.clone(),
                        courses: Vec::new(),
                        unavailable: BTreeSet::new(),
                    });
                    faculty.len() - 1
                });
            faculty[faculty_index].courses.push(index);
            courses.push(Course {
                name: name.clone(),
                faculty: faculty_index,
                min_lectures,
                conflicts: Vec::new(),
            });
        }

        for (name, slots) in self.unavailability {
            let index = *faculty_lookup
                .get(name.as_str())
                .ok_or_else(|| ValidationError::UnknownFaculty(name.clone()))?;
            if let Some(&slot) = slots.iter().find(|&&s| s >= slot_count) {
                return Err(ValidationError::SlotOutOfRange {
                    faculty: name,
                    slot,
                    slot_count,
                });
            }
            faculty[index].unavailable = slots;
        }

        for course in &courses {
            if course.min_lectures > slot_count {
                return Err(ValidationError::QuotaExceedsSlots {
                    course: course.name.clone(),
                    quota: course.min_lectures,
                    slot_count,
                });
            }
            let lecturer = &faculty[course.faculty];
            let available = slot_count - lecturer.unavailable.len() as u32;
            if course.min_lectures > available {
                return Err(ValidationError::QuotaExceedsAvailability {
                    course: course.name.clone(),
                    faculty: lecturer.name.clone(),
                    quota: course.min_lectures,
                    available,
                });
            }
        }

        for (first, second) in &self.conflicts {
            let lookup = |name: &String| {
                course_lookup
                    .get(name.as_str())
                    .copied()
                    .ok_or_else(|| ValidationError::UnknownCourse {
                        context: "conflict pair",
                        course: name.clone(),
                    })
            };
            let i = lookup(first)?;
            let j = lookup(second)?;
            if i == j {
                return Err(ValidationError::SelfConflict(first.clone()));
            }
            courses[i].conflicts.push(j);
            courses[j].conflicts.push(i);
        }
        for course in &mut courses {
            course.conflicts.sort_unstable();
            course.conflicts.dedup();
        }

        let rooms = self.rooms.into_iter().map(|name| Room { name }).collect();

        Ok(Problem {
            courses,
            faculty,
            rooms,
            horizon,
        })
    }
}
