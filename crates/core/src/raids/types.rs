use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{newest_first, OnDelete, Record, RecordKind, Reference, References, ValidationError};

use super::RaidError;

/// A planned raid on a trip, or on whoever is at a campsite that night.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Raid {
    pub id: Uuid,
    pub trips_year: i32,
    /// Set from the signed-in user.
    #[serde(default)]
    pub user: Uuid,
    #[serde(default)]
    pub netid: String,
    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub trip: Option<Uuid>,
    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub campsite: Option<Uuid>,
    pub date: NaiveDate,
    /// Theme, and whether to intercept on the trail or at the campsite.
    #[serde(default)]
    pub plan: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

impl Raid {
    pub fn new(trips_year: i32, user: Uuid, netid: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            user,
            netid: netid.into(),
            trip: None,
            campsite: None,
            date,
            plan: String::new(),
            created: Utc::now(),
        }
    }
}

impl Record for Raid {
    const KIND: RecordKind = RecordKind::Raid;

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        format!("{} {}", self.netid, self.date.format("%m/%d"))
    }

    fn references(&self) -> Vec<Reference> {
        References::new()
            .maybe(RecordKind::Trip, self.trip, "/trip", OnDelete::Cascade)
            .maybe(RecordKind::Campsite, self.campsite, "/campsite", OnDelete::Cascade)
            .build()
    }

    fn sort_key(&self) -> String {
        newest_first(self.created)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.trip.is_none() && self.campsite.is_none() {
            return Err(RaidError::NoTarget.into());
        }
        Ok(())
    }
}

/// A comment left on a raid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidComment {
    pub id: Uuid,
    pub trips_year: i32,
    #[serde(default)]
    pub user: Uuid,
    #[serde(default)]
    pub netid: String,
    pub raid: Uuid,
    pub comment: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

impl Record for RaidComment {
    const KIND: RecordKind = RecordKind::RaidComment;

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        format!("{}: {}", self.netid, self.comment)
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(RecordKind::Raid, self.raid, "/raid", OnDelete::Cascade)]
    }

    fn sort_key(&self) -> String {
        self.created.to_rfc3339()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.comment.trim().is_empty() {
            return Err(RaidError::EmptyComment.into());
        }
        Ok(())
    }
}

/// Instructions shown to raiders; one per year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidInfo {
    pub id: Uuid,
    pub trips_year: i32,
    #[serde(default)]
    pub instructions: String,
}

impl Record for RaidInfo {
    const KIND: RecordKind = RecordKind::RaidInfo;
    const UNIQUE_FIELDS: &'static str = "trips year";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        format!("Raid info for {}", self.trips_year)
    }

    fn unique_key(&self) -> Option<String> {
        Some("raid_info".to_string())
    }
}

/// Raids planned against each trip, soonest first.
pub fn raids_by_trip(raids: &[Raid]) -> HashMap<Uuid, Vec<&Raid>> {
    let mut by_trip: HashMap<Uuid, Vec<&Raid>> = HashMap::new();
    for raid in raids {
        if let Some(trip) = raid.trip {
            by_trip.entry(trip).or_default().push(raid);
        }
    }
    for planned in by_trip.values_mut() {
        planned.sort_by_key(|raid| (raid.date, raid.created));
    }
    by_trip
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, day).unwrap()
    }

    #[test]
    fn test_raid_needs_trip_or_campsite() {
        let mut raid = Raid::new(2024, Uuid::new_v4(), "d12345a", date(4));
        assert_eq!(raid.validate(), Err(ValidationError::from(RaidError::NoTarget)));

        raid.campsite = Some(Uuid::new_v4());
        assert!(raid.validate().is_ok());
        assert_eq!(raid.label(), "d12345a 09/04");
        assert_eq!(raid.references()[0].on_delete, OnDelete::Cascade);
    }

    #[test]
    fn test_newer_raids_sort_first() {
        let mut older = Raid::new(2024, Uuid::new_v4(), "a", date(4));
        let newer = Raid::new(2024, Uuid::new_v4(), "b", date(4));
        older.created = newer.created - Duration::hours(1);
        assert!(newer.sort_key() < older.sort_key());
    }

    #[test]
    fn test_raids_grouped_by_trip_in_date_order() {
        let trip = Uuid::new_v4();
        let mut late = Raid::new(2024, Uuid::new_v4(), "a", date(6));
        late.trip = Some(trip);
        let mut early = Raid::new(2024, Uuid::new_v4(), "b", date(4));
        early.trip = Some(trip);
        let mut campsite_only = Raid::new(2024, Uuid::new_v4(), "c", date(5));
        campsite_only.campsite = Some(Uuid::new_v4());

        let raids = [late, early, campsite_only];
        let grouped = raids_by_trip(&raids);
        assert_eq!(grouped.len(), 1);
        let netids: Vec<&str> = grouped[&trip].iter().map(|r| r.netid.as_str()).collect();
        assert_eq!(netids, ["b", "a"]);
    }

    #[test]
    fn test_comment_cascades_with_raid() {
        let comment = RaidComment {
            id: Uuid::new_v4(),
            trips_year: 2024,
            user: Uuid::new_v4(),
            netid: "d1".to_string(),
            raid: Uuid::new_v4(),
            comment: " ".to_string(),
            created: Utc::now(),
        };
        assert_eq!(comment.validate(), Err(ValidationError::from(RaidError::EmptyComment)));
        assert_eq!(comment.references()[0].on_delete, OnDelete::Cascade);
    }
}
