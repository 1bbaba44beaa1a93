use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{OnDelete, Record, RecordKind, Reference, References, ValidationError};

use super::TripError;

/// Largest number a trip template can be named.
pub const MAX_TEMPLATE_NAME: u16 = 999;

/// A trips section: a cohort of trips that leave and return on the same days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    pub trips_year: i32,
    /// A, B, C, etc.
    pub name: String,
    pub leaders_arrive: NaiveDate,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub is_exchange: bool,
    #[serde(default)]
    pub is_transfer: bool,
    #[serde(default)]
    pub is_international: bool,
    #[serde(default)]
    pub is_fysep: bool,
    #[serde(default)]
    pub is_native: bool,
}

impl Section {
    pub fn new(trips_year: i32, name: impl Into<String>, leaders_arrive: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            name: name.into(),
            leaders_arrive,
            is_local: false,
            is_exchange: false,
            is_transfer: false,
            is_international: false,
            is_fysep: false,
            is_native: false,
        }
    }

    fn offset(&self, days: u64) -> NaiveDate {
        self.leaders_arrive
            .checked_add_days(Days::new(days))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Date that trippees arrive in Hanover.
    pub fn trippees_arrive(&self) -> NaiveDate {
        self.offset(1)
    }

    pub fn at_campsite1(&self) -> NaiveDate {
        self.offset(2)
    }

    pub fn at_campsite2(&self) -> NaiveDate {
        self.offset(3)
    }

    pub fn arrive_at_lodge(&self) -> NaiveDate {
        self.offset(4)
    }

    pub fn return_to_campus(&self) -> NaiveDate {
        self.offset(5)
    }

    /// Nights spent on the trail.
    pub fn nights_camping(&self) -> [NaiveDate; 2] {
        [self.at_campsite1(), self.at_campsite2()]
    }

    /// Every date trippees are here for trips. Excludes the day leaders arrive.
    pub fn trip_dates(&self) -> Vec<NaiveDate> {
        (1..=5).map(|days| self.offset(days)).collect()
    }

    /// Leader dates, e.g. `Aug 10 to Aug 15`.
    pub fn date_range_str(&self) -> String {
        format!(
            "{} to {}",
            self.leaders_arrive.format("%b %d"),
            self.return_to_campus().format("%b %d")
        )
    }
}

impl Record for Section {
    const KIND: RecordKind = RecordKind::Section;
    const UNIQUE_FIELDS: &'static str = "name";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.chars().count() != 1 {
            return Err(TripError::InvalidSectionName(self.name.clone()).into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripType {
    pub id: Uuid,
    pub trips_year: i32,
    pub name: String,
    #[serde(default)]
    pub leader_description: String,
    #[serde(default)]
    pub trippee_description: String,
    #[serde(default)]
    pub packing_list: String,
}

impl TripType {
    pub fn new(trips_year: i32, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            name: name.into(),
            leader_description: String::new(),
            trippee_description: String::new(),
            packing_list: String::new(),
        }
    }
}

impl Record for TripType {
    const KIND: RecordKind = RecordKind::TripType;

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(TripError::EmptyName.into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campsite {
    pub id: Uuid,
    pub trips_year: i32,
    pub name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub directions: String,
    /// Directions for a quick exit.
    #[serde(default)]
    pub bugout: String,
    /// Door codes and other things not printed for trippees.
    #[serde(default)]
    pub secret: String,
}

impl Campsite {
    pub fn new(trips_year: i32, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            name: name.into(),
            capacity: None,
            directions: String::new(),
            bugout: String::new(),
            secret: String::new(),
        }
    }
}

impl Record for Campsite {
    const KIND: RecordKind = RecordKind::Campsite;

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(TripError::EmptyName.into());
        }
        Ok(())
    }
}

/// The reusable description of a trip: where it goes and how it gets there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripTemplate {
    pub id: Uuid,
    pub trips_year: i32,
    pub name: u16,
    #[serde(default)]
    pub description_summary: String,
    pub triptype: Uuid,
    pub max_trippees: u32,
    #[serde(default = "default_true")]
    pub non_swimmers_allowed: bool,
    pub dropoff_stop: Uuid,
    pub pickup_stop: Uuid,
    #[serde(default)]
    pub return_route: Option<Uuid>,
    pub campsite1: Uuid,
    pub campsite2: Uuid,
    #[serde(default)]
    pub description_introduction: String,
    #[serde(default)]
    pub description_day1: String,
    #[serde(default)]
    pub description_day2: String,
    #[serde(default)]
    pub description_day3: String,
    #[serde(default)]
    pub description_conclusion: String,
    #[serde(default)]
    pub revision_notes: String,
}

fn default_true() -> bool {
    true
}

impl TripTemplate {
    pub fn new(trips_year: i32, name: u16, triptype: Uuid, max_trippees: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            name,
            description_summary: String::new(),
            triptype,
            max_trippees,
            non_swimmers_allowed: true,
            dropoff_stop: Uuid::nil(),
            pickup_stop: Uuid::nil(),
            return_route: None,
            campsite1: Uuid::nil(),
            campsite2: Uuid::nil(),
            description_introduction: String::new(),
            description_day1: String::new(),
            description_day2: String::new(),
            description_day3: String::new(),
            description_conclusion: String::new(),
            revision_notes: String::new(),
        }
    }

    pub fn with_stops(mut self, dropoff_stop: Uuid, pickup_stop: Uuid) -> Self {
        self.dropoff_stop = dropoff_stop;
        self.pickup_stop = pickup_stop;
        self
    }

    pub fn with_campsites(mut self, campsite1: Uuid, campsite2: Uuid) -> Self {
        self.campsite1 = campsite1;
        self.campsite2 = campsite2;
        self
    }

    pub fn with_return_route(mut self, route: Uuid) -> Self {
        self.return_route = Some(route);
        self
    }

    /// Trippees plus the two leaders.
    pub fn max_num_people(&self) -> u32 {
        self.max_trippees + 2
    }
}

impl Record for TripTemplate {
    const KIND: RecordKind = RecordKind::TripTemplate;
    const UNIQUE_FIELDS: &'static str = "name";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        self.name.to_string()
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.name.to_string())
    }

    fn references(&self) -> Vec<Reference> {
        References::new()
            .one(RecordKind::TripType, self.triptype, "/triptype", OnDelete::Protect)
            .one(RecordKind::Stop, self.dropoff_stop, "/dropoff_stop", OnDelete::Protect)
            .one(RecordKind::Stop, self.pickup_stop, "/pickup_stop", OnDelete::Protect)
            .maybe(RecordKind::Route, self.return_route, "/return_route", OnDelete::Protect)
            .one(RecordKind::Campsite, self.campsite1, "/campsite1", OnDelete::Protect)
            .one(RecordKind::Campsite, self.campsite2, "/campsite2", OnDelete::Protect)
            .build()
    }

    fn sort_key(&self) -> String {
        format!("{:03}", self.name)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name > MAX_TEMPLATE_NAME {
            return Err(TripError::TemplateNameOutOfRange(self.name).into());
        }
        if self.max_trippees == 0 {
            return Err(TripError::NoTrippees.into());
        }
        Ok(())
    }
}

/// A template scheduled in a section.
///
/// The route fields override the template's routes when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub trips_year: i32,
    pub template: Uuid,
    pub section: Uuid,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub dropoff_route: Option<Uuid>,
    #[serde(default)]
    pub pickup_route: Option<Uuid>,
    #[serde(default)]
    pub return_route: Option<Uuid>,
}

impl Trip {
    pub fn new(trips_year: i32, template: Uuid, section: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            template,
            section,
            notes: String::new(),
            dropoff_route: None,
            pickup_route: None,
            return_route: None,
        }
    }
}

impl Record for Trip {
    const KIND: RecordKind = RecordKind::Trip;
    const UNIQUE_FIELDS: &'static str = "template and section";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    /// Replaced by `{section}{template}` once the section and template are
    /// known; see [`super::trip_label`].
    fn label(&self) -> String {
        self.id.to_string()
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("{}:{}", self.template, self.section))
    }

    fn references(&self) -> Vec<Reference> {
        References::new()
            .one(RecordKind::TripTemplate, self.template, "/template", OnDelete::Protect)
            .one(RecordKind::Section, self.section, "/section", OnDelete::Protect)
            .maybe(RecordKind::Route, self.dropoff_route, "/dropoff_route", OnDelete::Protect)
            .maybe(RecordKind::Route, self.pickup_route, "/pickup_route", OnDelete::Protect)
            .maybe(RecordKind::Route, self.return_route, "/return_route", OnDelete::Protect)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> Section {
        Section::new(2024, "A", NaiveDate::from_ymd_opt(2024, 8, 10).unwrap())
    }

    #[test]
    fn test_section_dates() {
        let section = section();
        assert_eq!(section.trippees_arrive(), NaiveDate::from_ymd_opt(2024, 8, 11).unwrap());
        assert_eq!(section.at_campsite1(), NaiveDate::from_ymd_opt(2024, 8, 12).unwrap());
        assert_eq!(section.at_campsite2(), NaiveDate::from_ymd_opt(2024, 8, 13).unwrap());
        assert_eq!(section.arrive_at_lodge(), NaiveDate::from_ymd_opt(2024, 8, 14).unwrap());
        assert_eq!(section.return_to_campus(), NaiveDate::from_ymd_opt(2024, 8, 15).unwrap());
        assert_eq!(section.trip_dates().len(), 5);
        assert_eq!(section.trip_dates()[0], section.trippees_arrive());
    }

    #[test]
    fn test_date_range_str() {
        assert_eq!(section().date_range_str(), "Aug 10 to Aug 15");
    }

    #[test]
    fn test_section_name_must_be_one_character() {
        let mut section = section();
        assert!(section.validate().is_ok());
        section.name = "AB".to_string();
        assert!(section.validate().is_err());
        section.name = String::new();
        assert!(section.validate().is_err());
    }

    #[test]
    fn test_template_name_range() {
        let mut template = TripTemplate::new(2024, 999, Uuid::new_v4(), 8);
        assert!(template.validate().is_ok());
        template.name = 1000;
        assert_eq!(
            template.validate().unwrap_err().0,
            "Value must be in range 0-999"
        );
    }

    #[test]
    fn test_max_num_people_counts_leaders() {
        let template = TripTemplate::new(2024, 12, Uuid::new_v4(), 8);
        assert_eq!(template.max_num_people(), 10);
    }

    #[test]
    fn test_template_references_skip_missing_return_route() {
        let template = TripTemplate::new(2024, 12, Uuid::new_v4(), 8)
            .with_stops(Uuid::new_v4(), Uuid::new_v4())
            .with_campsites(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(template.references().len(), 5);
        assert!(template
            .references()
            .iter()
            .all(|r| r.on_delete == OnDelete::Protect));

        let route = Uuid::new_v4();
        let template = template.with_return_route(route);
        assert!(template.references().iter().any(|r| r.target == route));
    }

    #[test]
    fn test_trip_unique_key_combines_template_and_section() {
        let template = Uuid::new_v4();
        let section = Uuid::new_v4();
        let a = Trip::new(2024, template, section);
        let b = Trip::new(2024, template, section);
        assert_ne!(a.id, b.id);
        assert_eq!(a.unique_key(), b.unique_key());
    }

    #[test]
    fn test_template_payload_defaults() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "trips_year": 2024,
            "name": 101,
            "triptype": Uuid::new_v4(),
            "max_trippees": 10,
            "dropoff_stop": Uuid::new_v4(),
            "pickup_stop": Uuid::new_v4(),
            "campsite1": Uuid::new_v4(),
            "campsite2": Uuid::new_v4(),
        });
        let template: TripTemplate = serde_json::from_value(json).unwrap();
        assert!(template.non_swimmers_allowed);
        assert_eq!(template.return_route, None);
        assert_eq!(template.sort_key(), "101");
    }
}
