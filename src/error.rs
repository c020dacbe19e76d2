use thiserror::Error;

/// Raised while building a [`Problem`](crate::model::Problem) from raw input.
///
/// Validation errors are fatal: the input is rejected before any constraint is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("the horizon is empty ({days} days x {slots_per_day} periods per day)")]
    EmptyHorizon { days: u32, slots_per_day: u32 },

    #[error("the horizon is too large ({days} days x {slots_per_day} periods per day)")]
    HorizonTooLarge { days: u32, slots_per_day: u32 },

    #[error("the instance spans {cells} course/slot/room cells, more than the limit of {limit}")]
    TooManyCells { cells: u64, limit: u64 },

    #[error("course '{0}' is declared more than once")]
    DuplicateCourse(String),

    #[error("room '{0}' is declared more than once")]
    DuplicateRoom(String),

    #[error("course '{0}' has no faculty assigned")]
    MissingFaculty(String),

    #[error("{context} references unknown course '{course}'")]
    UnknownCourse { context: &'static str, course: String },

    #[error("unavailability is declared for '{0}', who teaches no course")]
    UnknownFaculty(String),

    #[error("faculty '{faculty}' is unavailable at slot {slot}, outside 0..{slot_count}")]
    SlotOutOfRange {
        faculty: String,
        slot: u32,
        slot_count: u32,
    },

    #[error("course '{0}' has no minimum lecture count")]
    MissingQuota(String),

    #[error("course '{course}' needs {quota} lectures but the week only has {slot_count} slots")]
    QuotaExceedsSlots {
        course: String,
        quota: u32,
        slot_count: u32,
    },

    #[error("course '{course}' needs {quota} lectures but '{faculty}' is only available for {available} slots")]
    QuotaExceedsAvailability {
        course: String,
        faculty: String,
        quota: u32,
        available: u32,
    },

    #[error("course '{0}' is declared in conflict with itself")]
    SelfConflict(String),
}
