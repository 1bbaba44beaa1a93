use serde::{Deserialize, Serialize};

use crate::record::RecordKind;

/// One season of the trips database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripsYear {
    pub year: i32,
    pub is_current: bool,
}

impl TripsYear {
    pub fn new(year: i32, is_current: bool) -> Self {
        Self { year, is_current }
    }

    /// The year that follows this one, as the new current year.
    pub fn next(&self) -> Self {
        Self {
            year: self.year + 1,
            is_current: true,
        }
    }
}

impl std::fmt::Display for TripsYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.year)
    }
}

/// Landing page data for a year: the year plus how many records of each kind it holds.
#[derive(Debug, Clone, Serialize)]
pub struct YearSummary {
    pub trips_year: TripsYear,
    pub counts: Vec<(RecordKind, usize)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_year_is_current() {
        let year = TripsYear::new(2024, true);
        assert_eq!(year.next(), TripsYear::new(2025, true));
    }
}
