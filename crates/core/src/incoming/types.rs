use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::applications::{TshirtSize, YesNo};
use crate::record::{OnDelete, Record, RecordKind, Reference, References, ValidationError};

use super::IncomingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncomingStatus {
    Exchange,
    Transfer,
    #[serde(rename = "FIRSTYEAR")]
    FirstYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwimmingAbility {
    NonSwimmer,
    #[default]
    Beginner,
    Competent,
    Expert,
}

/// A student the registrar expects this fall.
///
/// The registrar fields are imported from a spreadsheet; the rest is
/// managed by the directorate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingStudent {
    pub id: Uuid,
    pub trips_year: i32,
    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub registration: Option<Uuid>,
    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub trip_assignment: Option<Uuid>,
    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub bus_assignment_round_trip: Option<Uuid>,
    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub bus_assignment_to_hanover: Option<Uuid>,
    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub bus_assignment_from_hanover: Option<Uuid>,
    /// Percentage of costs covered, 0 to 100.
    #[serde(default)]
    pub financial_aid: u8,
    /// Cancelled students are still charged.
    #[serde(default)]
    pub cancelled: bool,
    /// Custom cancellation fee in cents. Defaults to the aid-adjusted trip cost.
    #[serde(default)]
    pub cancelled_fee: Option<u32>,
    #[serde(default)]
    pub med_info: String,
    #[serde(default)]
    pub decline_reason: String,
    #[serde(default)]
    pub notes: String,

    pub name: String,
    pub netid: String,
    #[serde(default)]
    pub class_year: String,
    #[serde(default)]
    pub ethnic_code: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub birthday: String,
    #[serde(default)]
    pub incoming_status: Option<IncomingStatus>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub blitz: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub hinman_box: String,
}

impl IncomingStudent {
    pub fn clear_medical_info(&mut self) {
        self.med_info.clear();
    }

    pub fn new(trips_year: i32, name: impl Into<String>, netid: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            registration: None,
            trip_assignment: None,
            bus_assignment_round_trip: None,
            bus_assignment_to_hanover: None,
            bus_assignment_from_hanover: None,
            financial_aid: 0,
            cancelled: false,
            cancelled_fee: None,
            med_info: String::new(),
            decline_reason: String::new(),
            notes: String::new(),
            name: name.into(),
            netid: netid.into(),
            class_year: String::new(),
            ethnic_code: String::new(),
            gender: String::new(),
            birthday: String::new(),
            incoming_status: None,
            email: String::new(),
            blitz: String::new(),
            phone: String::new(),
            address: String::new(),
            hinman_box: String::new(),
        }
    }

    pub fn bus_to_hanover(&self) -> Option<Uuid> {
        self.bus_assignment_round_trip.or(self.bus_assignment_to_hanover)
    }

    pub fn bus_from_hanover(&self) -> Option<Uuid> {
        self.bus_assignment_round_trip.or(self.bus_assignment_from_hanover)
    }

    /// Last word of the name.
    pub fn lastname(&self) -> &str {
        self.name.split_whitespace().last().unwrap_or("")
    }

    /// Town, state and nation from a four line registrar address.
    pub fn hometown(&self) -> String {
        let parts: Vec<&str> = self.address.split('\n').collect();
        if parts.len() != 4 {
            return self.address.clone();
        }
        let city_state: Vec<&str> = parts[2].split(' ').collect();
        let city_state = city_state[..city_state.len().saturating_sub(1)].join(" ");
        format!("{} {}", city_state, parts[3])
    }
}

impl Record for IncomingStudent {
    const KIND: RecordKind = RecordKind::IncomingStudent;
    const UNIQUE_FIELDS: &'static str = "netid";

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
        Some(self.netid.to_lowercase())
    }

    fn references(&self) -> Vec<Reference> {
        References::new()
            .maybe(RecordKind::Registration, self.registration, "/registration", OnDelete::SetNull)
            .maybe(RecordKind::Trip, self.trip_assignment, "/trip_assignment", OnDelete::Protect)
            .maybe(
                RecordKind::Stop,
                self.bus_assignment_round_trip,
                "/bus_assignment_round_trip",
                OnDelete::Protect,
            )
            .maybe(
                RecordKind::Stop,
                self.bus_assignment_to_hanover,
                "/bus_assignment_to_hanover",
                OnDelete::Protect,
            )
            .maybe(
                RecordKind::Stop,
                self.bus_assignment_from_hanover,
                "/bus_assignment_from_hanover",
                OnDelete::Protect,
            )
            .build()
    }

    fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.netid.trim().is_empty() {
            return Err(IncomingError::EmptyNetid.into());
        }
        if self.financial_aid > 100 {
            return Err(IncomingError::FinancialAidOutOfRange(self.financial_aid).into());
        }
        let one_way = self.bus_assignment_to_hanover.is_some()
            || self.bus_assignment_from_hanover.is_some();
        if one_way && self.bus_assignment_round_trip.is_some() {
            return Err(IncomingError::RoundTripAndOneWayAssignment.into());
        }
        Ok(())
    }
}

/// Registration form submitted by an incoming student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    pub trips_year: i32,
    /// User id of the registrant.
    pub user: Uuid,
    pub name: String,
    #[serde(default)]
    pub netid: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub previous_school: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub guardian_email: String,
    #[serde(default)]
    pub is_exchange: Option<YesNo>,
    #[serde(default)]
    pub is_transfer: Option<YesNo>,
    #[serde(default)]
    pub is_international: Option<YesNo>,
    #[serde(default)]
    pub is_native: Option<YesNo>,
    #[serde(default)]
    pub is_fysep: Option<YesNo>,
    #[serde(default)]
    pub is_athlete: String,

    #[serde(default)]
    pub preferred_sections: Vec<Uuid>,
    #[serde(default)]
    pub available_sections: Vec<Uuid>,
    #[serde(default)]
    pub unavailable_sections: Vec<Uuid>,
    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub firstchoice_triptype: Option<Uuid>,
    #[serde(default)]
    pub preferred_triptypes: Vec<Uuid>,
    #[serde(default)]
    pub available_triptypes: Vec<Uuid>,
    #[serde(default)]
    pub unavailable_triptypes: Vec<Uuid>,
    #[serde(default)]
    pub schedule_conflicts: String,

    pub tshirt_size: TshirtSize,
    #[serde(default)]
    pub medical_conditions: String,
    #[serde(default)]
    pub food_allergies: String,
    #[serde(default)]
    pub dietary_restrictions: String,
    #[serde(default)]
    pub epipen: Option<YesNo>,
    #[serde(default)]
    pub needs: String,

    #[serde(default)]
    pub swimming_ability: SwimmingAbility,
    #[serde(default)]
    pub camping_experience: YesNo,
    #[serde(default)]
    pub hiking_experience: YesNo,
    #[serde(default)]
    pub anything_else: String,

    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub bus_stop_round_trip: Option<Uuid>,
    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub bus_stop_to_hanover: Option<Uuid>,
    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub bus_stop_from_hanover: Option<Uuid>,

    #[serde(default)]
    pub financial_assistance: YesNo,
    #[serde(default)]
    pub waiver: YesNo,
    #[serde(default)]
    pub doc_membership: YesNo,
    /// Donation in cents.
    #[serde(default)]
    pub green_fund_donation: u32,
    #[serde(default)]
    pub final_request: String,
}

impl Registration {
    pub fn new(
        trips_year: i32,
        user: Uuid,
        name: impl Into<String>,
        netid: impl Into<String>,
        tshirt_size: TshirtSize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            user,
            name: name.into(),
            netid: netid.into(),
            gender: String::new(),
            previous_school: String::new(),
            phone: String::new(),
            email: String::new(),
            guardian_email: String::new(),
            is_exchange: None,
            is_transfer: None,
            is_international: None,
            is_native: None,
            is_fysep: None,
            is_athlete: String::new(),
            preferred_sections: Vec::new(),
            available_sections: Vec::new(),
            unavailable_sections: Vec::new(),
            firstchoice_triptype: None,
            preferred_triptypes: Vec::new(),
            available_triptypes: Vec::new(),
            unavailable_triptypes: Vec::new(),
            schedule_conflicts: String::new(),
            tshirt_size,
            medical_conditions: String::new(),
            food_allergies: String::new(),
            dietary_restrictions: String::new(),
            epipen: None,
            needs: String::new(),
            swimming_ability: SwimmingAbility::default(),
            camping_experience: YesNo::No,
            hiking_experience: YesNo::No,
            anything_else: String::new(),
            bus_stop_round_trip: None,
            bus_stop_to_hanover: None,
            bus_stop_from_hanover: None,
            financial_assistance: YesNo::No,
            waiver: YesNo::Yes,
            doc_membership: YesNo::No,
            green_fund_donation: 0,
            final_request: String::new(),
        }
    }

    pub fn is_non_swimmer(&self) -> bool {
        self.swimming_ability == SwimmingAbility::NonSwimmer
    }

    pub fn wants_bus(&self) -> bool {
        self.bus_stop_round_trip.is_some()
            || self.bus_stop_to_hanover.is_some()
            || self.bus_stop_from_hanover.is_some()
    }
}

fn is_yes(flag: Option<YesNo>) -> bool {
    flag.is_some_and(|f| f.is_yes())
}

impl Registration {
    pub fn native(&self) -> bool {
        is_yes(self.is_native)
    }

    pub fn fysep(&self) -> bool {
        is_yes(self.is_fysep)
    }

    pub fn international(&self) -> bool {
        is_yes(self.is_international)
    }

    /// Blanks every health field. Run on a year's registrations once it is retired.
    pub fn clear_medical_info(&mut self) {
        self.food_allergies.clear();
        self.dietary_restrictions.clear();
        self.medical_conditions.clear();
        self.epipen = None;
        self.needs.clear();
    }
}

impl Record for Registration {
    const KIND: RecordKind = RecordKind::Registration;
    const UNIQUE_FIELDS: &'static str = "user";

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
        Some(self.user.to_string())
    }

    fn references(&self) -> Vec<Reference> {
        References::new()
            .many(RecordKind::Section, &self.preferred_sections, "/preferred_sections")
            .many(RecordKind::Section, &self.available_sections, "/available_sections")
            .many(RecordKind::Section, &self.unavailable_sections, "/unavailable_sections")
            .maybe(
                RecordKind::TripType,
                self.firstchoice_triptype,
                "/firstchoice_triptype",
                OnDelete::SetNull,
            )
            .many(RecordKind::TripType, &self.preferred_triptypes, "/preferred_triptypes")
            .many(RecordKind::TripType, &self.available_triptypes, "/available_triptypes")
            .many(RecordKind::TripType, &self.unavailable_triptypes, "/unavailable_triptypes")
            .maybe(RecordKind::Stop, self.bus_stop_round_trip, "/bus_stop_round_trip", OnDelete::Protect)
            .maybe(RecordKind::Stop, self.bus_stop_to_hanover, "/bus_stop_to_hanover", OnDelete::Protect)
            .maybe(
                RecordKind::Stop,
                self.bus_stop_from_hanover,
                "/bus_stop_from_hanover",
                OnDelete::Protect,
            )
            .build()
    }

    fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !self.waiver.is_yes() {
            return Err(IncomingError::WaiverRequired.into());
        }
        let one_way = self.bus_stop_to_hanover.is_some() || self.bus_stop_from_hanover.is_some();
        if one_way && self.bus_stop_round_trip.is_some() {
            return Err(IncomingError::RoundTripAndOneWayRequest.into());
        }
        Ok(())
    }
}

/// Costs for one trips year, in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingSettings {
    pub id: Uuid,
    pub trips_year: i32,
    pub trips_cost: u32,
    pub doc_membership_cost: u32,
    #[serde(default)]
    pub contact_url: String,
}

impl IncomingSettings {
    pub fn new(trips_year: i32, trips_cost: u32, doc_membership_cost: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            trips_cost,
            doc_membership_cost,
            contact_url: String::new(),
        }
    }
}

impl Record for IncomingSettings {
    const KIND: RecordKind = RecordKind::IncomingSettings;
    const UNIQUE_FIELDS: &'static str = "trips year";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        format!("Settings for {}", self.trips_year)
    }

    fn unique_key(&self) -> Option<String> {
        Some("incoming_settings".to_string())
    }
}
