mod content;
mod error;
mod grading;
mod preferences;
mod types;

pub use content::{ApplicationInfo, PortalContent};
pub use error::ApplicationError;
pub use grading::{
    ensure_not_graded, grade_progress, next_croo_to_grade_for, next_to_grade, Grade, GradeKind,
    GradeProgress, NUMBER_OF_CROO_GRADES, NUMBER_OF_LEADER_GRADES,
};
pub use preferences::{available_trips, preferred_trips};
pub use types::{
    ApplicationStatus, Croo, CrooGrade, CrooSupplement, GeneralApplication, LeaderGrade,
    LeaderSupplement, RolePreference, TshirtSize, YesNo, MAX_GRADE, MIN_GRADE,
};
