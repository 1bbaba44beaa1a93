//! The singleton calendar of important trips dates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timetable {
    pub applications_open: DateTime<Utc>,
    pub applications_close: DateTime<Utc>,
    pub leader_assignment_posted: DateTime<Utc>,
    pub trippee_registrations_open: DateTime<Utc>,
    pub trippee_registrations_close: DateTime<Utc>,
    pub trippee_assignment_posted: DateTime<Utc>,
    pub migration_date: DateTime<Utc>,
}

impl Timetable {
    /// A timetable with every date set to `now`.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            applications_open: now,
            applications_close: now,
            leader_assignment_posted: now,
            trippee_registrations_open: now,
            trippee_registrations_close: now,
            trippee_assignment_posted: now,
            migration_date: now,
        }
    }

    pub fn applications_available(&self, now: DateTime<Utc>) -> bool {
        self.applications_open < now && now < self.applications_close
    }

    /// Grading opens once the application deadline has passed.
    pub fn grading_available(&self, now: DateTime<Utc>) -> bool {
        self.applications_close < now
    }

    pub fn registration_available(&self, now: DateTime<Utc>) -> bool {
        self.trippee_registrations_open < now && now < self.trippee_registrations_close
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_applications_window() {
        let now = Utc::now();
        let mut timetable = Timetable::starting_at(now);
        assert!(!timetable.applications_available(now));

        timetable.applications_open = now - Duration::days(1);
        timetable.applications_close = now + Duration::days(1);
        assert!(timetable.applications_available(now));
        assert!(!timetable.grading_available(now));

        assert!(timetable.grading_available(now + Duration::days(2)));
    }

    #[test]
    fn test_registration_window_is_exclusive() {
        let now = Utc::now();
        let mut timetable = Timetable::starting_at(now);
        timetable.trippee_registrations_open = now;
        timetable.trippee_registrations_close = now + Duration::hours(1);

        assert!(!timetable.registration_available(now));
        assert!(timetable.registration_available(now + Duration::minutes(1)));
    }
}
